// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-shared car state block: a POSIX shared-memory record carrying
//! a `PTHREAD_PROCESS_SHARED` mutex and condition variable, mapped into the
//! car, controller, safety monitor, and internal panel processes under the
//! name `/car<name>`.
//!
//! All raw pointer and `pthread` FFI use lives in this module; callers only
//! see the safe [`SharedCar`] handle and its lock guard.

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::time::Duration;

use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::mman::{mmap, munmap, shm_open, shm_unlink, MapFlags, ProtFlags};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;

use crate::error::ShmError;
use crate::floor::FloorIndex;
use crate::protocol::CarStatus;

/// The on-the-wire layout of the shared block, matching the
/// `car_shared_mem` record field-for-field. `current_floor` and
/// `destination_floor` hold label text (`"7"`, `"B3"`), not raw integers;
/// `status` holds the literal status name.
#[repr(C)]
struct RawBlock {
    mutex: libc::pthread_mutex_t,
    cond: libc::pthread_cond_t,
    current_floor: [u8; 4],
    destination_floor: [u8; 4],
    status: [u8; 8],
    open_button: u8,
    close_button: u8,
    door_obstruction: u8,
    overload: u8,
    emergency_stop: u8,
    individual_service_mode: u8,
    emergency_mode: u8,
    safety_system: u8,
}

/// A mapped, process-shared car state block.
///
/// Dropping a `SharedCar` unmaps the block. Only the creator (the car
/// process) should call [`SharedCar::close`] to additionally destroy the
/// synchronization primitives and unlink the name; attachers should simply
/// let the value drop.
pub struct SharedCar {
    ptr: NonNull<RawBlock>,
    name: String,
    is_creator: bool,
}

// The block is explicitly designed for concurrent cross-process access
// behind its own pthread mutex; the Rust type system has no visibility into
// that, so we assert the marker traits by hand.
#[allow(unsafe_code)]
unsafe impl Send for SharedCar {}
#[allow(unsafe_code)]
unsafe impl Sync for SharedCar {}

/// Holds the block's mutex for the lifetime of the guard. Always construct
/// through [`SharedCar::lock`]; the guard's `Drop` impl unlocks.
pub struct CarGuard<'a> {
    block: &'a SharedCar,
}

fn shm_path(name: &str) -> Result<CString, ShmError> {
    CString::new(format!("/car{name}")).map_err(|_| ShmError::InvalidName)
}

impl SharedCar {
    /// Create and publish a new named block. Only the car process should
    /// call this. Initializes the mutex and condition variable as
    /// process-shared and sets `status = Closed`,
    /// `current_floor = destination_floor = lowest`, all flags zero.
    #[allow(unsafe_code)]
    pub fn create(name: &str, lowest: FloorIndex) -> Result<Self, ShmError> {
        let path = shm_path(name)?;
        let size = std::mem::size_of::<RawBlock>();

        let fd = shm_open(
            path.as_c_str(),
            OFlag::O_CREAT | OFlag::O_RDWR | OFlag::O_EXCL,
            Mode::from_bits_truncate(0o666),
        )
        .map_err(ShmError::Open)?;

        if let Err(e) = ftruncate(&fd, size as i64) {
            let _ = shm_unlink(path.as_c_str());
            return Err(ShmError::Truncate(e));
        }

        // SAFETY: fd is a freshly truncated shm object of exactly `size`
        // bytes; the mapping is dropped (unmapped) only via `munmap` below.
        #[allow(clippy::expect_used)]
        let addr = match unsafe {
            mmap(
                None,
                NonZeroUsize::new(size).expect("RawBlock is non-zero sized"),
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &fd,
                0,
            )
        } {
            Ok(addr) => addr,
            Err(e) => {
                let _ = shm_unlink(path.as_c_str());
                return Err(ShmError::Map(e));
            }
        };
        let ptr = addr.cast::<RawBlock>();

        // SAFETY: ptr points at a freshly mapped, zero-initialized region
        // exactly `size_of::<RawBlock>()` long.
        unsafe { init_pshared_primitives(ptr.as_ptr())? };

        let label = lowest.label();
        let mut current_floor = [0u8; 4];
        let mut destination_floor = [0u8; 4];
        write_fixed(&mut current_floor, &label);
        write_fixed(&mut destination_floor, &label);

        // SAFETY: no other process can have attached yet; we hold the only
        // reference to this freshly created mapping.
        unsafe {
            let block = ptr.as_ptr();
            (*block).current_floor = current_floor;
            (*block).destination_floor = destination_floor;
            write_fixed(&mut (*block).status, CarStatus::Closed.as_str());
            (*block).safety_system = 1;
        }

        Ok(Self {
            ptr,
            name: name.to_string(),
            is_creator: true,
        })
    }

    /// Attach to an existing block published by [`SharedCar::create`].
    #[allow(unsafe_code)]
    pub fn open(name: &str) -> Result<Self, ShmError> {
        let path = shm_path(name)?;
        let size = std::mem::size_of::<RawBlock>();

        let fd = shm_open(path.as_c_str(), OFlag::O_RDWR, Mode::empty()).map_err(ShmError::Open)?;

        let found = nix::sys::stat::fstat(&fd)
            .map(|st| st.st_size as usize)
            .unwrap_or(size);
        if found < size {
            return Err(ShmError::SizeMismatch {
                expected: size,
                found,
            });
        }

        // SAFETY: fd refers to an object at least `size` bytes long,
        // created by a prior call to `create`.
        #[allow(clippy::expect_used)]
        let addr = unsafe {
            mmap(
                None,
                NonZeroUsize::new(size).expect("RawBlock is non-zero sized"),
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &fd,
                0,
            )
        }
        .map_err(ShmError::Map)?;

        Ok(Self {
            ptr: addr.cast::<RawBlock>(),
            name: name.to_string(),
            is_creator: false,
        })
    }

    /// The car name this block is published under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the block's mutex.
    #[allow(unsafe_code)]
    pub fn lock(&self) -> CarGuard<'_> {
        // SAFETY: the mutex was initialized process-shared in `create` and
        // lives as long as `self`.
        unsafe {
            libc::pthread_mutex_lock(&mut (*self.ptr.as_ptr()).mutex);
        }
        CarGuard { block: self }
    }

    /// Broadcast the condition variable. Caller must hold the lock.
    #[allow(unsafe_code)]
    pub fn notify_all(&self, _guard: &CarGuard<'_>) {
        // SAFETY: guard proves the mutex is held by this thread.
        unsafe {
            libc::pthread_cond_broadcast(&mut (*self.ptr.as_ptr()).cond);
        }
    }

    /// Wait on the condition variable indefinitely. Caller must hold the
    /// lock; it is re-acquired before returning. Used by the safety
    /// monitor, which has nothing else to do between broadcasts.
    #[allow(unsafe_code)]
    pub fn wait(&self, _guard: &CarGuard<'_>) {
        // SAFETY: guard proves the mutex is held; cond and mutex are both
        // process-shared and live as long as `self`.
        unsafe {
            libc::pthread_cond_wait(&mut (*self.ptr.as_ptr()).cond, &mut (*self.ptr.as_ptr()).mutex);
        }
    }

    /// Wait on the condition variable for up to `timeout`, returning
    /// `true` if signalled and `false` on timeout. Caller must hold the
    /// lock; it is re-acquired before returning either way.
    #[allow(unsafe_code)]
    pub fn wait_timeout(&self, _guard: &CarGuard<'_>, timeout: Duration) -> bool {
        let mut ts = MaybeUninit::<libc::timespec>::uninit();
        // SAFETY: CLOCK_REALTIME is always a valid clock id.
        unsafe {
            libc::clock_gettime(libc::CLOCK_REALTIME, ts.as_mut_ptr());
        }
        let mut ts = unsafe { ts.assume_init() };
        ts.tv_sec += timeout.as_secs() as libc::time_t;
        ts.tv_nsec += timeout.subsec_nanos() as i64;
        if ts.tv_nsec >= 1_000_000_000 {
            ts.tv_sec += 1;
            ts.tv_nsec -= 1_000_000_000;
        }

        // SAFETY: guard proves the mutex is held; cond and mutex are both
        // process-shared and live as long as `self`.
        let rc = unsafe {
            libc::pthread_cond_timedwait(
                &mut (*self.ptr.as_ptr()).cond,
                &mut (*self.ptr.as_ptr()).mutex,
                &ts,
            )
        };
        rc == 0
    }

    #[allow(unsafe_code)]
    fn raw(&self) -> &RawBlock {
        // SAFETY: self.ptr is valid for the lifetime of self.
        unsafe { self.ptr.as_ref() }
    }

    #[allow(unsafe_code)]
    fn raw_mut(&self) -> &mut RawBlock {
        // SAFETY: self.ptr is valid for the lifetime of self; callers only
        // reach this through a held `CarGuard`.
        unsafe { &mut *self.ptr.as_ptr() }
    }

    /// Unmap and, if this handle created the block, destroy the
    /// synchronization primitives and unlink the shared-memory name.
    #[allow(unsafe_code)]
    pub fn close(self) -> Result<(), ShmError> {
        let size = std::mem::size_of::<RawBlock>();
        if self.is_creator {
            // SAFETY: no other thread in this process holds the mutex at
            // shutdown; cross-process attachers are expected to have
            // already unmapped following the car's `EMERGENCY`/teardown.
            unsafe {
                libc::pthread_mutex_destroy(&mut (*self.ptr.as_ptr()).mutex);
                libc::pthread_cond_destroy(&mut (*self.ptr.as_ptr()).cond);
            }
        }
        let addr = self.ptr.cast::<std::ffi::c_void>();
        // SAFETY: addr/size are exactly the mapping made in create/open.
        unsafe { munmap(addr, size) }.map_err(ShmError::Unmap)?;
        if self.is_creator {
            let path = shm_path(&self.name)?;
            shm_unlink(path.as_c_str()).map_err(ShmError::Unlink)?;
        }
        std::mem::forget(self);
        Ok(())
    }
}

impl Drop for SharedCar {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        let size = std::mem::size_of::<RawBlock>();
        let addr = self.ptr.cast::<std::ffi::c_void>();
        // SAFETY: addr/size are exactly the mapping made in create/open;
        // this only runs if `close` was never called.
        unsafe {
            let _ = munmap(addr, size);
        }
    }
}

#[allow(unsafe_code)]
unsafe fn init_pshared_primitives(block: *mut RawBlock) -> Result<(), ShmError> {
    let mut mutex_attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
    let mut cond_attr = MaybeUninit::<libc::pthread_condattr_t>::uninit();

    // SAFETY: attrs are stack-local and initialized before use.
    unsafe {
        libc::pthread_mutexattr_init(mutex_attr.as_mut_ptr());
        libc::pthread_mutexattr_setpshared(mutex_attr.as_mut_ptr(), libc::PTHREAD_PROCESS_SHARED);
        let rc = libc::pthread_mutex_init(&mut (*block).mutex, mutex_attr.as_ptr());
        if rc != 0 {
            return Err(ShmError::PthreadInit("mutex_init", rc));
        }

        libc::pthread_condattr_init(cond_attr.as_mut_ptr());
        libc::pthread_condattr_setpshared(cond_attr.as_mut_ptr(), libc::PTHREAD_PROCESS_SHARED);
        let rc = libc::pthread_cond_init(&mut (*block).cond, cond_attr.as_ptr());
        if rc != 0 {
            return Err(ShmError::PthreadInit("cond_init", rc));
        }
    }
    Ok(())
}

/// Copy `text` into a fixed buffer, zero-padding the remainder. Panics (in
/// debug builds of callers that violate it) only if `text` cannot fit,
/// which field-width invariants in §3 rule out for valid labels/statuses.
fn write_fixed(buf: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    buf.iter_mut().for_each(|b| *b = 0);
    buf[..bytes.len()].copy_from_slice(bytes);
}

fn read_fixed(buf: &[u8]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..end]).unwrap_or("")
}

impl CarGuard<'_> {
    pub fn current_floor(&self) -> Option<FloorIndex> {
        FloorIndex::parse(read_fixed(&self.block.raw().current_floor)).ok()
    }

    pub fn destination_floor(&self) -> Option<FloorIndex> {
        FloorIndex::parse(read_fixed(&self.block.raw().destination_floor)).ok()
    }

    pub fn set_current_floor(&self, floor: FloorIndex) {
        write_fixed(&mut self.block.raw_mut().current_floor, &floor.label());
    }

    pub fn set_destination_floor(&self, floor: FloorIndex) {
        write_fixed(&mut self.block.raw_mut().destination_floor, &floor.label());
    }

    pub fn status(&self) -> Option<CarStatus> {
        CarStatus::parse(read_fixed(&self.block.raw().status)).ok()
    }

    pub fn set_status(&self, status: CarStatus) {
        write_fixed(&mut self.block.raw_mut().status, status.as_str());
    }

    pub fn open_button(&self) -> bool {
        self.block.raw().open_button != 0
    }

    pub fn set_open_button(&self, value: bool) {
        self.block.raw_mut().open_button = value as u8;
    }

    pub fn close_button(&self) -> bool {
        self.block.raw().close_button != 0
    }

    pub fn set_close_button(&self, value: bool) {
        self.block.raw_mut().close_button = value as u8;
    }

    pub fn door_obstruction(&self) -> bool {
        self.block.raw().door_obstruction != 0
    }

    pub fn set_door_obstruction(&self, value: bool) {
        self.block.raw_mut().door_obstruction = value as u8;
    }

    pub fn overload(&self) -> bool {
        self.block.raw().overload != 0
    }

    pub fn set_overload(&self, value: bool) {
        self.block.raw_mut().overload = value as u8;
    }

    pub fn emergency_stop(&self) -> bool {
        self.block.raw().emergency_stop != 0
    }

    pub fn set_emergency_stop(&self, value: bool) {
        self.block.raw_mut().emergency_stop = value as u8;
    }

    pub fn individual_service_mode(&self) -> bool {
        self.block.raw().individual_service_mode != 0
    }

    pub fn set_individual_service_mode(&self, value: bool) {
        self.block.raw_mut().individual_service_mode = value as u8;
    }

    pub fn emergency_mode(&self) -> bool {
        self.block.raw().emergency_mode != 0
    }

    pub fn set_emergency_mode(&self, value: bool) {
        self.block.raw_mut().emergency_mode = value as u8;
    }

    pub fn safety_system(&self) -> u8 {
        self.block.raw().safety_system
    }

    /// The seven boolean flags as raw bytes, in field-declaration order.
    /// Used by the safety monitor, which must distinguish a byte that is
    /// neither 0 nor 1 (data corruption) from a clean boolean read — a
    /// distinction the [`CarGuard::open_button`]-style accessors collapse.
    pub fn raw_flag_bytes(&self) -> [u8; 7] {
        let raw = self.block.raw();
        [
            raw.open_button,
            raw.close_button,
            raw.door_obstruction,
            raw.overload,
            raw.emergency_stop,
            raw.individual_service_mode,
            raw.emergency_mode,
        ]
    }

    pub fn set_safety_system(&self, value: u8) {
        self.block.raw_mut().safety_system = value;
    }
}

impl Drop for CarGuard<'_> {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: this guard is the proof the mutex is held by this thread.
        unsafe {
            libc::pthread_mutex_unlock(&mut (*self.block.ptr.as_ptr()).mutex);
        }
    }
}

#[cfg(test)]
#[path = "shm_tests.rs"]
mod tests;
