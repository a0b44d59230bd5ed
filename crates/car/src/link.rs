// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The car's control link: reconnect loop plus transmit/receive threads
//! against the controller at `127.0.0.1:3000`.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use elevator_core::floor::FloorIndex;
use elevator_core::frame::{receive_frame, send_frame};
use elevator_core::protocol::{CarStatus, Message};
use elevator_core::shm::SharedCar;
use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use crate::config::Range;
use crate::motion::PendingFloor;

const CONTROLLER_ADDR: &str = "127.0.0.1:3000";
/// Consecutive missed transmit ticks before the car declares itself
/// disconnected from the safety system and forces emergency mode.
const MAX_MISSED_TICKS: u8 = 3;

/// Signals the transmit thread that a status change occurred and it should
/// send immediately rather than waiting out the rest of its tick.
#[derive(Default)]
pub struct TxSignal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl TxSignal {
    pub fn raise(&self) {
        *self.flag.lock() = true;
        self.cond.notify_all();
    }

    fn wait_until(&self, deadline: Instant) -> bool {
        let mut flag = self.flag.lock();
        while !*flag {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let remaining = deadline - now;
            let timed_out = self.cond.wait_for(&mut flag, remaining);
            if *flag {
                break;
            }
            if timed_out.timed_out() {
                return false;
            }
        }
        *flag = false;
        true
    }
}

fn connectable(car: &SharedCar) -> bool {
    let guard = car.lock();
    !guard.individual_service_mode() && !guard.emergency_mode()
}

/// Floor 1 always parses; used only as a fallback when the block's own
/// floor fields fail to parse, which invariant 2 (§3) rules out in
/// practice.
#[allow(clippy::unwrap_used)]
fn ground_floor() -> FloorIndex {
    FloorIndex::new(1).unwrap()
}

fn post_status(stream: &mut TcpStream, car: &SharedCar) -> std::io::Result<()> {
    let guard = car.lock();
    let status = guard.status().unwrap_or(CarStatus::Closed);
    let current = guard.current_floor().unwrap_or_else(ground_floor);
    let destination = guard.destination_floor().unwrap_or_else(ground_floor);
    drop(guard);
    let msg = Message::Status {
        status,
        current,
        destination,
    };
    send_frame(stream, &msg.render()).map_err(|_| std::io::ErrorKind::BrokenPipe.into())
}

fn receive_loop(
    mut stream: TcpStream,
    car: Arc<SharedCar>,
    pending: PendingFloor,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let payload = match receive_frame(&mut stream) {
            Ok(p) => p,
            Err(_) => return,
        };
        let Ok(Message::Floor(floor)) = Message::parse(&payload) else {
            continue;
        };
        let between = {
            let guard = car.lock();
            guard.status() == Some(CarStatus::Between)
        };
        if between {
            *pending.lock() = Some(floor);
        } else {
            let guard = car.lock();
            guard.set_destination_floor(floor);
            car.notify_all(&guard);
        }
    }
}

fn transmit_loop(
    mut stream: TcpStream,
    car: Arc<SharedCar>,
    delay_ms: u64,
    signal: Arc<TxSignal>,
    shutdown: Arc<AtomicBool>,
) {
    let mut deadline = Instant::now() + Duration::from_millis(delay_ms);
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let raised = signal.wait_until(deadline);
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        if raised {
            if post_status(&mut stream, &car).is_err() {
                return;
            }
            deadline = Instant::now() + Duration::from_millis(delay_ms);
        }

        if Instant::now() >= deadline {
            let missed = {
                let guard = car.lock();
                let next = guard.safety_system().saturating_add(1);
                guard.set_safety_system(next);
                car.notify_all(&guard);
                next
            };
            if missed >= MAX_MISSED_TICKS {
                warn!("safety system disconnected, entering emergency mode");
                let guard = car.lock();
                guard.set_emergency_mode(true);
                car.notify_all(&guard);
                drop(guard);
                let _ = send_frame(&mut stream, &Message::Emergency.render());
                return;
            }
            deadline = Instant::now() + Duration::from_millis(delay_ms);
        }

        let (service, emergency) = {
            let guard = car.lock();
            (guard.individual_service_mode(), guard.emergency_mode())
        };
        if service {
            let _ = send_frame(&mut stream, &Message::IndividualService.render());
            return;
        }
        if emergency {
            let _ = send_frame(&mut stream, &Message::Emergency.render());
            return;
        }
    }
}

/// Repeatedly attempt a connection to the controller, gated on the car
/// being out of service/emergency mode; runs the transmit/receive threads
/// against each successful connection until it drops, then reconnects
/// after a `delay_ms` backoff.
pub fn run(
    car: Arc<SharedCar>,
    name: String,
    range: Range,
    delay_ms: u64,
    pending: PendingFloor,
    signal: Arc<TxSignal>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        while !shutdown.load(Ordering::Relaxed) && !connectable(&car) {
            thread::sleep(Duration::from_millis(delay_ms));
        }
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        let mut stream = match TcpStream::connect(CONTROLLER_ADDR) {
            Ok(s) => s,
            Err(_) => {
                thread::sleep(Duration::from_millis(delay_ms));
                continue;
            }
        };

        let registration = Message::CarRegister {
            name: name.clone(),
            low: range.lowest,
            high: range.highest,
        };
        if send_frame(&mut stream, &registration.render()).is_err() {
            thread::sleep(Duration::from_millis(delay_ms));
            continue;
        }
        if post_status(&mut stream, &car).is_err() {
            thread::sleep(Duration::from_millis(delay_ms));
            continue;
        }

        info!(car = %name, "connected to controller");

        let rx_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(_) => {
                thread::sleep(Duration::from_millis(delay_ms));
                continue;
            }
        };
        let rx_car = Arc::clone(&car);
        let rx_pending = Arc::clone(&pending);
        let rx_shutdown = Arc::clone(&shutdown);
        let rx = thread::spawn(move || receive_loop(rx_stream, rx_car, rx_pending, rx_shutdown));

        let tx_car = Arc::clone(&car);
        let tx_signal = Arc::clone(&signal);
        let tx_shutdown = Arc::clone(&shutdown);
        let tx = thread::spawn(move || transmit_loop(stream, tx_car, delay_ms, tx_signal, tx_shutdown));

        let _ = rx.join();
        let _ = tx.join();
        info!(car = %name, "disconnected from controller");
    }
}
