/*!
# Reusable buffers for rendered names

The pool hands out string slots which hold the rendering of one qualified
name. Slots are kept after release, so that steady-state parsing does not
allocate per tag.
*/
use log::trace;

use crate::error::{Error, Result};

/// Handle to a live slot of a [`NameBufferPool`].
///
/// The handle is neither `Clone` nor `Copy`: it has to be given back through
/// [`NameBufferPool::release`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct SlotId(usize);

#[derive(Debug, Default)]
struct Slot {
	buf: String,
	live: bool,
}

/// Arena of reusable name buffers.
#[derive(Debug, Default)]
pub struct NameBufferPool {
	slots: Vec<Slot>,
	free: Vec<usize>,
}

fn grow_to(buf: &mut String, min_capacity: usize) -> Result<()> {
	if buf.capacity() >= min_capacity {
		return Ok(());
	}
	let target = min_capacity
		.checked_next_power_of_two()
		.ok_or(Error::OutOfMemory)?;
	buf.try_reserve_exact(target - buf.len())
		.map_err(|_| Error::OutOfMemory)
}

impl NameBufferPool {
	pub fn new() -> Self {
		Self::default()
	}

	/// Obtain an empty slot with at least `min_capacity` bytes of capacity.
	///
	/// Reservation failures are reported as [`Error::OutOfMemory`].
	pub fn allocate(&mut self, min_capacity: usize) -> Result<SlotId> {
		let index = match self.free.pop() {
			Some(index) => index,
			None => {
				self.slots.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
				self.free.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
				self.slots.push(Slot::default());
				self.slots.len() - 1
			}
		};
		let slot = &mut self.slots[index];
		debug_assert!(!slot.live);
		slot.buf.clear();
		if let Err(e) = grow_to(&mut slot.buf, min_capacity) {
			self.free.push(index);
			return Err(e);
		}
		slot.live = true;
		trace!("name slot {} allocated (capacity {})", index, slot.buf.capacity());
		Ok(SlotId(index))
	}

	/// Return a slot to the pool.
	pub fn release(&mut self, id: SlotId) {
		let slot = &mut self.slots[id.0];
		debug_assert!(slot.live);
		slot.live = false;
		slot.buf.clear();
		self.free.push(id.0);
	}

	/// Read the contents of a live slot.
	pub fn get(&self, id: &SlotId) -> &str {
		let slot = &self.slots[id.0];
		debug_assert!(slot.live);
		slot.buf.as_str()
	}

	/// Access the buffer of a live slot for writing.
	pub fn buf_mut(&mut self, id: &SlotId) -> &mut String {
		let slot = &mut self.slots[id.0];
		debug_assert!(slot.live);
		&mut slot.buf
	}

	/// Mark every slot as free.
	///
	/// Outstanding [`SlotId`]s must not be used afterwards; callers drop them
	/// together with the records holding them.
	pub fn reset(&mut self) {
		self.free.clear();
		for (index, slot) in self.slots.iter_mut().enumerate().rev() {
			slot.live = false;
			slot.buf.clear();
			self.free.push(index);
		}
	}

	/// Drop the memory held by free slots.
	pub fn release_temporaries(&mut self) {
		if self.live() == 0 {
			self.slots = Vec::new();
			self.free = Vec::new();
			return;
		}
		for &index in self.free.iter() {
			self.slots[index].buf = String::new();
		}
		self.free.shrink_to_fit();
	}

	/// Number of slots currently handed out.
	pub fn live(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	/// Number of slots owned by the pool, live or free.
	pub fn len(&self) -> usize {
		self.slots.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allocate_grows_to_power_of_two() {
		let mut pool = NameBufferPool::new();
		let id = pool.allocate(20).unwrap();
		assert!(pool.buf_mut(&id).capacity() >= 32);
		assert_eq!(pool.get(&id), "");
		pool.release(id);
	}

	#[test]
	fn released_slot_is_reused() {
		let mut pool = NameBufferPool::new();
		let a = pool.allocate(4).unwrap();
		pool.buf_mut(&a).push_str("abcd");
		pool.release(a);
		let b = pool.allocate(4).unwrap();
		assert_eq!(pool.len(), 1);
		assert_eq!(pool.get(&b), "");
		pool.release(b);
	}

	#[test]
	fn live_slot_is_not_handed_out_again() {
		let mut pool = NameBufferPool::new();
		let a = pool.allocate(8).unwrap();
		pool.buf_mut(&a).push_str("outer");
		let b = pool.allocate(8).unwrap();
		pool.buf_mut(&b).push_str("inner");
		assert_ne!(a, b);
		pool.release(b);
		let c = pool.allocate(8).unwrap();
		pool.buf_mut(&c).push_str("other");
		assert_eq!(pool.get(&a), "outer");
		assert_eq!(pool.live(), 2);
		pool.release(c);
		pool.release(a);
		assert_eq!(pool.live(), 0);
	}

	#[test]
	fn reset_frees_everything() {
		let mut pool = NameBufferPool::new();
		let _a = pool.allocate(8).unwrap();
		let _b = pool.allocate(8).unwrap();
		assert_eq!(pool.live(), 2);
		pool.reset();
		assert_eq!(pool.live(), 0);
		assert_eq!(pool.len(), 2);
	}

	#[test]
	fn release_temporaries_drops_free_slots() {
		let mut pool = NameBufferPool::new();
		let a = pool.allocate(8).unwrap();
		pool.release(a);
		pool.release_temporaries();
		assert_eq!(pool.len(), 0);
	}

	#[test]
	fn oversized_reservation_is_out_of_memory() {
		let mut pool = NameBufferPool::new();
		match pool.allocate(usize::MAX) {
			Err(Error::OutOfMemory) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(pool.live(), 0);
	}
}
