// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;

use std::net::TcpStream;
use std::process::ExitCode;

use clap::Parser;
use elevator_core::floor::FloorIndex;
use elevator_core::frame::{receive_frame, send_frame};
use elevator_core::protocol::Message;

use config::Config;

const CONTROLLER_ADDR: &str = "127.0.0.1:3000";

/// Performs the call and returns the line to print. Never fails outward:
/// every error path collapses to a user-facing message instead of a
/// propagated `Result`, so the process always exits cleanly.
fn place_call(src: FloorIndex, dst: FloorIndex) -> String {
    let mut stream = match TcpStream::connect(CONTROLLER_ADDR) {
        Ok(s) => s,
        Err(_) => return "Unable to connect to elevator system.".to_string(),
    };

    let request = Message::Call { src, dst };
    if send_frame(&mut stream, &request.render()).is_err() {
        return "Unable to connect to elevator system.".to_string();
    }

    let response = match receive_frame(&mut stream) {
        Ok(p) => p,
        Err(_) => return "Unable to connect to elevator system.".to_string(),
    };

    response_message(&response)
}

/// Renders the controller's reply payload into the line printed to the
/// user. Any payload that isn't a `CAR <name>` assignment — including a
/// literal `UNAVAILABLE` or anything unparseable — reads as unavailable.
fn response_message(payload: &str) -> String {
    match Message::parse(payload) {
        Ok(Message::CarAssigned { name }) => format!("Car {name} is arriving."),
        _ => "Sorry, no car is available to take this request.".to_string(),
    }
}

fn main() -> ExitCode {
    let config = Config::parse();

    let src = FloorIndex::parse(&config.src);
    let dst = FloorIndex::parse(&config.dst);
    let (src, dst) = match (src, dst) {
        (Ok(s), Ok(d)) => (s, d),
        _ => {
            println!("Invalid floor(s) specified.");
            return ExitCode::SUCCESS;
        }
    };

    if src == dst {
        println!("You are already on that floor!");
        return ExitCode::SUCCESS;
    }

    println!("{}", place_call(src, dst));
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_assignment_reads_as_arriving() {
        assert_eq!(response_message("CAR A"), "Car A is arriving.");
    }

    #[test]
    fn unavailable_reads_as_sorry() {
        assert_eq!(
            response_message("UNAVAILABLE"),
            "Sorry, no car is available to take this request."
        );
    }

    #[test]
    fn garbage_payload_reads_as_sorry() {
        assert_eq!(
            response_message("nonsense"),
            "Sorry, no car is available to take this request."
        );
    }
}
