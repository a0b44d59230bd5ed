// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection handling: the first frame on every socket determines
//! whether it is a car registering itself or a caller placing a floor call.

use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use elevator_core::floor::FloorIndex;
use elevator_core::frame::{receive_frame, send_frame};
use elevator_core::protocol::Message;
use tracing::{info, warn};

use crate::registry::Registry;

/// Validates and orders a registration's floor range, swapping a misordered
/// pair rather than rejecting it — the controller is more forgiving here
/// than the car binary's own argument parsing.
fn ordered_range(low: FloorIndex, high: FloorIndex) -> (FloorIndex, FloorIndex) {
    if low.index() > high.index() {
        (high, low)
    } else {
        (low, high)
    }
}

fn handle_car(mut stream: TcpStream, registry: &Registry, name: String, low: FloorIndex, high: FloorIndex) {
    let (lowest, highest) = ordered_range(low, high);
    let socket = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };
    if let Err(e) = registry.register(socket, name.clone(), lowest, highest) {
        warn!(car = %name, error = %e, "failed to register car");
        return;
    }
    info!(car = %name, "car registered");

    loop {
        let payload = match receive_frame(&mut stream) {
            Ok(p) => p,
            Err(_) => {
                registry.remove(&name);
                return;
            }
        };
        match Message::parse(&payload) {
            Ok(Message::Status {
                status,
                current,
                destination,
            }) => registry.on_status(&name, status, current, destination),
            Ok(Message::IndividualService) | Ok(Message::Emergency) => continue,
            _ => {
                registry.remove(&name);
                return;
            }
        }
    }
}

fn handle_call(mut stream: TcpStream, registry: &Registry, src: FloorIndex, dst: FloorIndex) {
    if src == dst {
        let _ = send_frame(&mut stream, &Message::Unavailable.render());
        let _ = stream.shutdown(Shutdown::Write);
        return;
    }

    match registry.car_selector(src, dst) {
        Some(name) => {
            let _ = send_frame(
                &mut stream,
                &Message::CarAssigned { name: name.clone() }.render(),
            );
            registry.dispatch_call(&name, src, dst);
        }
        None => {
            let _ = send_frame(&mut stream, &Message::Unavailable.render());
        }
    }
    let _ = stream.shutdown(Shutdown::Write);
}

/// True if `payload` is shaped like a `CALL <src> <dst>` request — used to
/// tell "a call with an invalid floor label" apart from "not a call at
/// all" once `Message::parse` has already rejected it.
fn is_call_shaped(payload: &str) -> bool {
    payload.split(' ').next() == Some("CALL")
}

/// Reads the first frame off a freshly accepted connection and dispatches
/// it to the car-registration or call-routing path.
pub fn handle(mut stream: TcpStream, registry: Arc<Registry>) {
    let payload = match receive_frame(&mut stream) {
        Ok(p) => p,
        Err(_) => return,
    };
    match Message::parse(&payload) {
        Ok(Message::CarRegister { name, low, high }) => handle_car(stream, &registry, name, low, high),
        Ok(Message::Call { src, dst }) => handle_call(stream, &registry, src, dst),
        _ if is_call_shaped(&payload) => {
            // A CALL frame with an invalid floor label (e.g. `CALL 0 5`)
            // fails parsing just like an equal-floor call; both answer
            // UNAVAILABLE rather than dropping the connection silently.
            let _ = send_frame(&mut stream, &Message::Unavailable.render());
            let _ = stream.shutdown(Shutdown::Write);
        }
        _ => {}
    }
}
