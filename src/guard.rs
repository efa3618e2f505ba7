/*!
    pre-transmission normalization of joint-angle commands.

    Servos accept angles in `[-125, 125]`. A simultaneous joint command
    (`L`, or its binary variant `I`) may carry angles outside that range;
    [expand] turns one logical task into the ordered queue of transport
    tasks that keeps every transmitted angle in range.
*/

use std::time::Duration;

use log::*;

use crate::task::{Task, Payload, TaskQueue};


/// servo angle range enforced before transmission
pub const ANGLE_LIMIT: i32 = 125;

/// pacing of a clamped primary task, so its correction follows promptly
const CORRECTION_HANDOFF: Duration = Duration::from_millis(10);


/**
    expand one logical task into its transport task queue.

    - token `L` with angles: out-of-range angles are clamped in place, in
      4×4 scan order, and a follow-up `i` correction task carrying the flat
      `(index, clamped angle)` list is queued after the clamped command
    - token `I` with angles: any out-of-range angle rewrites the token to
      `i`, telling the device the angles come raw
    - anything else passes through as a single-element queue
*/
pub fn expand(task: Task) -> TaskQueue {
    let mut queue = TaskQueue::new();
    match task.payload {
        Payload::Numeric {token: 'L', values} if !values.is_empty() => {
            let mut values = values;
            let mut corrections = Vec::new();
            for i in 0 .. 4 {
                for j in 0 .. 4 {
                    let index = 4*j + i;
                    let Some(angle) = values.get_mut(index) else {continue};
                    if *angle < -ANGLE_LIMIT || *angle > ANGLE_LIMIT {
                        *angle = (*angle).clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
                        corrections.extend([index as i32, *angle]);
                    }
                }
            }
            if corrections.is_empty() {
                queue.push(Task::numeric('L', values, task.pacing));
            }
            else {
                debug!("clamped angles, corrections: {:?}", corrections);
                queue.push(Task::numeric('L', values, CORRECTION_HANDOFF));
                queue.push(Task::numeric('i', corrections, task.pacing));
            }
        },
        Payload::Numeric {token: 'I', values} if !values.is_empty() => {
            let token =
                if values.iter().any(|&angle| angle < -ANGLE_LIMIT || angle > ANGLE_LIMIT) {'i'}
                else {'I'};
            queue.push(Task::numeric(token, values, task.pacing));
        },
        payload => queue.push(Task {payload, pacing: task.pacing}),
    }
    queue
}
