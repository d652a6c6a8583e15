// Command dispatcher: executes remote commands against the HAL
//
// A session keeps the undecoded tail of the byte stream, so a command split
// across receive chunks is still executed once complete. Several commands in
// one chunk are executed in order.

use tracing::{debug, info, warn};

use crate::comms::ChannelId;
use crate::error::Result;
use crate::hal::{Hal, Reading};
use crate::messages::{Command, Reply};
use crate::wait::WaitOutcome;

fn motion_reply(result: Result<Option<WaitOutcome>>) -> Reply {
    match result {
        Ok(Some(WaitOutcome::Completed)) => Reply::Ok,
        Ok(Some(WaitOutcome::Cancelled)) => Reply::Cancelled,
        Ok(None) => Reply::Absent,
        Err(e) => Reply::error(e),
    }
}

fn value_reply(result: Result<Option<Reading>>) -> Reply {
    match result {
        Ok(Some(value)) => Reply::Value { value },
        Ok(None) => Reply::Absent,
        Err(e) => Reply::error(e),
    }
}

fn unit_reply(result: Result<Option<()>>) -> Reply {
    match result {
        Ok(Some(())) => Reply::Ok,
        Ok(None) => Reply::Absent,
        Err(e) => Reply::error(e),
    }
}

/// Run one command to completion
pub fn execute(hal: &mut Hal, cmd: &Command) -> Reply {
    info!("Received command: {:?}", cmd);
    let drive = hal.config().drive.clone();
    let (left, right) = (drive.left.as_str(), drive.right.as_str());

    match cmd {
        Command::Drive { direction, speed } => {
            motion_reply(hal.regulated_drive(left, right, *direction, *speed))
        }
        Command::DriveDistance {
            direction,
            speed,
            distance,
        } => motion_reply(hal.drive_distance(left, right, *direction, *speed, *distance)),
        Command::Rotate { turn, speed } => {
            motion_reply(hal.rotate_continuous(left, right, *speed, *turn))
        }
        Command::RotateAngle { turn, speed, angle } => {
            motion_reply(hal.rotate_in_place(left, right, *speed, *angle, *turn))
        }
        Command::Curve {
            direction,
            left_speed,
            right_speed,
            distance,
        } => motion_reply(hal.drive_curve(
            left,
            right,
            *direction,
            *left_speed,
            *right_speed,
            *distance,
        )),
        Command::Stop => motion_reply(hal.stop_motors(left, right)),
        Command::Motor { port, speed } => motion_reply(hal.turn_on_motor(port, *speed)),
        Command::RotateMotor {
            port,
            speed,
            unit,
            value,
        } => motion_reply(hal.rotate_motor(port, *speed, *unit, *value)),
        Command::StopMotor { port, mode } => motion_reply(hal.stop_motor(port, *mode)),
        Command::SetMotorSpeed { port, speed } => {
            motion_reply(hal.set_motor_speed(port, *speed))
        }
        Command::MotorSpeed { port } => {
            value_reply(hal.motor_speed(port).map(|v| v.map(Reading::Number)))
        }
        Command::Read { port, query } => value_reply(hal.query(port, *query)),
        Command::Tacho { port, mode } => {
            value_reply(hal.motor_tacho_value(port, *mode).map(|v| v.map(Reading::Number)))
        }
        Command::ResetTacho { port } => motion_reply(hal.reset_motor_tacho(port)),
        Command::ResetGyro { port } => unit_reply(hal.reset_gyro(port)),
        Command::SetMainsFrequency { port, hz } => {
            unit_reply(hal.set_mains_frequency(port, *hz))
        }
        Command::Timer { id } => Reply::Value {
            value: Reading::Number(hal.timer_value(*id) as f64),
        },
        Command::ResetTimer { id } => {
            hal.reset_timer(*id);
            Reply::Ok
        }
    }
}

/// Reassembles JSON commands from a chunked text stream
#[derive(Debug, Default)]
pub struct Session {
    pending: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and execute every command it completes
    pub fn feed(&mut self, hal: &mut Hal, chunk: &str) -> Vec<Reply> {
        self.pending.push_str(chunk);
        let mut replies = Vec::new();
        let mut consumed = 0;

        {
            let mut stream =
                serde_json::Deserializer::from_str(&self.pending).into_iter::<Command>();
            loop {
                match stream.next() {
                    Some(Ok(cmd)) => {
                        replies.push(execute(hal, &cmd));
                        consumed = stream.byte_offset();
                    }
                    // incomplete command, wait for the rest
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => {
                        warn!("Failed to parse command: {}", e);
                        replies.push(Reply::error(e));
                        consumed = self.pending.len();
                        break;
                    }
                    None => {
                        consumed = stream.byte_offset();
                        break;
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        replies
    }
}

/// Serve commands on `channel` until it faults or the stop signal is raised.
/// Returns the number of replies sent.
pub fn serve(hal: &mut Hal, channel: ChannelId) -> usize {
    info!("Serving commands on channel {}", channel);
    let mut session = Session::new();
    let mut sent = 0;

    while !hal.stop_signal().is_raised() {
        let Some(chunk) = hal.receive(channel) else {
            break;
        };
        for reply in session.feed(hal, &chunk) {
            match serde_json::to_string(&reply) {
                Ok(mut text) => {
                    text.push('\n');
                    hal.send(channel, &text);
                    sent += 1;
                }
                Err(e) => warn!("Failed to encode reply: {}", e),
            }
        }
    }

    if hal.is_open(channel) {
        debug!("channel {} left open", channel);
    } else {
        warn!("channel {} closed", channel);
    }
    info!("Served {} replies", sent);
    sent
}
