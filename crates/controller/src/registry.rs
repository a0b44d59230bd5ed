// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Car registry: tracks every connected car, its floor range, its assigned
//! floor queue, and the shared state block the controller mirrors status
//! into on every update.

use std::collections::VecDeque;
use std::net::TcpStream;

use elevator_core::floor::FloorIndex;
use elevator_core::frame::send_frame;
use elevator_core::protocol::{CarStatus, Message};
use elevator_core::shm::SharedCar;
use parking_lot::Mutex;

/// Registered cars are capped to a small fixed roster, not an unbounded
/// list.
pub const MAX_CARS: usize = 16;
/// Per-car pending floor queue depth.
pub const MAX_QUEUE: usize = 32;

#[derive(Debug)]
pub enum RegisterError {
    Full,
    Shm(elevator_core::error::ShmError),
}

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterError::Full => write!(f, "car registry is full"),
            RegisterError::Shm(e) => write!(f, "failed to attach shared state: {e}"),
        }
    }
}

impl std::error::Error for RegisterError {}

pub struct CarEntry {
    pub name: String,
    pub lowest: FloorIndex,
    pub highest: FloorIndex,
    pub status: CarStatus,
    pub current_floor: FloorIndex,
    pub destination_floor: FloorIndex,
    queue: VecDeque<FloorIndex>,
    socket: Mutex<TcpStream>,
    shm: SharedCar,
}

impl CarEntry {
    /// Range containment for both ends of a call; does not check that the
    /// two floors differ, which the caller validates before routing.
    pub fn can_service(&self, src: FloorIndex, dst: FloorIndex) -> bool {
        let in_range = |f: FloorIndex| f.index() >= self.lowest.index() && f.index() <= self.highest.index();
        in_range(src) && in_range(dst)
    }

    fn in_queue(&self, floor: FloorIndex) -> Option<usize> {
        self.queue.iter().position(|f| *f == floor)
    }

    /// Append `src` then `dst`, correcting for a `dst` that was already
    /// queued ahead of `src`: a car already committed to visiting `dst`
    /// before it would reach the new `src` must revisit `dst` afterwards,
    /// so the stale entry is dropped and re-appended at the tail.
    fn enqueue(&mut self, src: FloorIndex, dst: FloorIndex) {
        if src == dst {
            return;
        }
        if self.in_queue(src).is_none() && self.queue.len() < MAX_QUEUE {
            self.queue.push_back(src);
        }
        if let (Some(src_idx), Some(dst_idx)) = (self.in_queue(src), self.in_queue(dst)) {
            if dst_idx < src_idx {
                self.queue.remove(dst_idx);
            }
        }
        if self.in_queue(dst).is_none() && self.queue.len() < MAX_QUEUE {
            self.queue.push_back(dst);
        }
    }

    fn send_head(&self) {
        if let Some(head) = self.queue.front().copied() {
            let msg = Message::Floor(head);
            let _ = send_frame(&mut self.socket.lock(), &msg.render());
        }
    }

    /// Mirrors the latest STATUS report into the car's own shared state
    /// block, broadcasting so any local waiter (the safety monitor, an
    /// internal panel) observes the change.
    fn mirror_shm(&self) {
        let guard = self.shm.lock();
        guard.set_status(self.status);
        guard.set_current_floor(self.current_floor);
        guard.set_destination_floor(self.destination_floor);
        self.shm.notify_all(&guard);
    }

    /// If the head of the queue has just been reached and its doors are
    /// opening, pop it and dispatch the next pending floor, if any.
    fn run_scheduler(&mut self) {
        if let Some(head) = self.queue.front().copied() {
            if self.status == CarStatus::Opening && self.current_floor == head {
                self.queue.pop_front();
            }
        }
        if !self.queue.is_empty() {
            self.send_head();
        }
    }
}

#[derive(Default)]
pub struct Registry {
    cars: Mutex<Vec<Option<CarEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut cars = Vec::with_capacity(MAX_CARS);
        cars.resize_with(MAX_CARS, || None);
        Registry {
            cars: Mutex::new(cars),
        }
    }

    /// Registers a car, reusing its existing slot on a name match (a
    /// reconnect) or claiming the first free slot. The shared state block
    /// is attached (not created — the car process owns creation) and
    /// immediately mirrored to the registration floor range.
    pub fn register(
        &self,
        socket: TcpStream,
        name: String,
        lowest: FloorIndex,
        highest: FloorIndex,
    ) -> Result<(), RegisterError> {
        let shm = SharedCar::open(&name).map_err(RegisterError::Shm)?;
        let entry = CarEntry {
            name: name.clone(),
            lowest,
            highest,
            status: CarStatus::Closed,
            current_floor: lowest,
            destination_floor: lowest,
            queue: VecDeque::with_capacity(MAX_QUEUE),
            socket: Mutex::new(socket),
            shm,
        };
        entry.mirror_shm();

        let mut cars = self.cars.lock();
        if let Some(slot) = cars.iter_mut().find(|c| c.as_ref().is_some_and(|c| c.name == name)) {
            *slot = Some(entry);
            return Ok(());
        }
        if let Some(slot) = cars.iter_mut().find(|c| c.is_none()) {
            *slot = Some(entry);
            return Ok(());
        }
        Err(RegisterError::Full)
    }

    pub fn remove(&self, name: &str) {
        let mut cars = self.cars.lock();
        if let Some(slot) = cars.iter_mut().find(|c| c.as_ref().is_some_and(|c| c.name == name)) {
            *slot = None;
        }
    }

    /// Applies a STATUS report: updates the registry row, mirrors it into
    /// shared memory, and runs the scheduler for that car.
    pub fn on_status(&self, name: &str, status: CarStatus, current: FloorIndex, destination: FloorIndex) {
        let mut cars = self.cars.lock();
        if let Some(car) = cars.iter_mut().flatten().find(|c| c.name == name) {
            car.status = status;
            car.current_floor = current;
            car.destination_floor = destination;
            car.mirror_shm();
            car.run_scheduler();
        }
    }

    /// First-fit car whose range covers both ends of a call.
    pub fn car_selector(&self, src: FloorIndex, dst: FloorIndex) -> Option<String> {
        let cars = self.cars.lock();
        cars.iter()
            .flatten()
            .find(|c| c.can_service(src, dst))
            .map(|c| c.name.clone())
    }

    /// Queues a call onto the named car and (re-)sends the current queue
    /// head unconditionally, even if it didn't change.
    pub fn dispatch_call(&self, name: &str, src: FloorIndex, dst: FloorIndex) {
        let mut cars = self.cars.lock();
        if let Some(car) = cars.iter_mut().flatten().find(|c| c.name == name) {
            car.enqueue(src, dst);
            car.send_head();
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
