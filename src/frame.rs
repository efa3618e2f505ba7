/*!
    pure encoding of a [Task] into its wire frame.

    A frame is `token byte + payload + terminator`. The token alone decides
    the payload representation and the terminator: binary-packed payloads end
    with `'~'`, ASCII payloads with `'\n'`. No payload value can change the
    framing once the token is fixed.
*/

use log::*;

use crate::{
    Error,
    task::{Task, Payload, MULTIWORD_TOKENS, split_glued_argument},
    };


/// terminator of binary-packed frames
pub const BINARY_END: u8 = b'~';
/// terminator of ASCII frames
pub const TEXT_END: u8 = b'\n';

/// joint angles above this magnitude force a skill command rescale
const SKILL_ANGLE_LIMIT: i32 = 125;
/// header slot set to 2 when a skill command has been rescaled
const SKILL_SCALE_SLOT: usize = 3;


/// encode a task into the exact byte sequence for the wire
pub fn encode(task: &Task) -> Result<Vec<u8>, Error> {
    match &task.payload {
        Payload::Numeric {token, values} => encode_numeric(*token, values),
        Payload::Textual {words} => encode_textual(words),
    }
}

/// encode a token with integer arguments
pub fn encode_numeric(token: char, values: &[i32]) -> Result<Vec<u8>, Error> {
    debug!("encode numeric, token={:?}, values={:?}", token, values);
    if token == 'K' {
        encode_skill(values)
    }
    else if token.is_uppercase() {
        let mut frame = vec![token as u8];
        match token {
            // W and C expect unsigned bytes
            'W' | 'C' => for &value in values {
                frame.push(u8::try_from(value).map_err(|_| Error::Range(value))?);
            },
            // B interleaves (id, duration) pairs, durations in units of 8ms
            'B' => for (index, &value) in values.iter().enumerate() {
                let value = if index % 2 == 1 {value * 8} else {value};
                frame.push(pack_signed(value)?);
            },
            _ => for &value in values {
                frame.push(pack_signed(value)?);
            },
        }
        frame.push(BINARY_END);
        Ok(frame)
    }
    else {
        // lowercase tokens go as ASCII decimal text
        let text = values.iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let mut frame = vec![token as u8];
        frame.extend_from_slice(text.as_bytes());
        frame.push(TEXT_END);
        Ok(frame)
    }
}

/**
    encode a `K` skill command: a variable-size header followed by
    `|period|` rows of frame data.

    If any joint angle of any row exceeds the servo range, the whole command
    is rescaled: header slot 3 is set to 2 and every angle of every row is
    halved. The halving truncates toward zero, as the receiving firmware
    expects (lossy for odd values, kept as-is on purpose).
*/
fn encode_skill(values: &[i32]) -> Result<Vec<u8>, Error> {
    let &period = values.first()
        .ok_or(Error::MalformedTask("skill command without period"))?;
    let skill_header = if period > 0 {4} else {7};
    let frame_size =
        if period > 1 {8}
        else if period == 1 {16}
        else {20};

    let mut values = values.to_vec();
    if skill_rows(values.len(), period, skill_header, frame_size)
        .flatten()
        .any(|index| values[index] < -SKILL_ANGLE_LIMIT || values[index] > SKILL_ANGLE_LIMIT)
    {
        values[SKILL_SCALE_SLOT] = 2;
        for index in skill_rows(values.len(), period, skill_header, frame_size).flatten() {
            values[index] /= 2;
        }
        debug!("rescaled: {:?}", values);
    }

    let mut frame = vec![b'K'];
    for &value in &values {
        frame.push(pack_signed(value)?);
    }
    frame.push(BINARY_END);
    Ok(frame)
}

/// index ranges of the angle slice of each skill row, clipped to the payload's end
fn skill_rows(len: usize, period: i32, skill_header: usize, frame_size: usize)
    -> impl Iterator<Item=std::ops::Range<usize>>
{
    (0 .. period.unsigned_abs() as usize).map(move |row| {
        let start = (skill_header + row*frame_size).min(len);
        let end = (start + frame_size.min(16)).min(len);
        start .. end
    })
}

/// encode a command expressed as whole words
pub fn encode_textual(words: &[String]) -> Result<Vec<u8>, Error> {
    let first = words.first()
        .ok_or(Error::MalformedTask("empty command"))?;
    let token = first.chars().next()
        .ok_or(Error::MalformedTask("empty command word"))?;
    debug!("encode textual, words={:?}", words);

    if MULTIWORD_TOKENS.contains(token) && words.len() >= 2 {
        // conversational commands keep their words as-is
        let mut frame = words.join(" ").into_bytes();
        frame.push(TEXT_END);
        Ok(frame)
    }
    else if token == 'L' || token == 'I' {
        // simultaneous joint commands: arguments are packed binary
        let words = split_glued_argument(words);
        let mut frame = vec![token as u8];
        for word in &words[1 ..] {
            let value: i32 = word.trim().parse()
                .map_err(|_| Error::Decode(word.clone()))?;
            frame.push(pack_signed(value)?);
        }
        frame.push(BINARY_END);
        Ok(frame)
    }
    else if matches!(token, 'w' | 'k' | 'X') {
        // skill names and raw console input pass through verbatim
        let mut frame = first.clone().into_bytes();
        frame.push(TEXT_END);
        Ok(frame)
    }
    else {
        let mut frame = token.to_string().into_bytes();
        frame.push(TEXT_END);
        Ok(frame)
    }
}

fn pack_signed(value: i32) -> Result<u8, Error> {
    Ok(i8::try_from(value).map_err(|_| Error::Range(value))? as u8)
}
