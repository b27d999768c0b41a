use std::fmt;

#[cfg(all(feature = "shared_ns", feature = "mt"))]
use std::sync::{Mutex, MutexGuard, Weak};
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::cell::{RefCell, RefMut};
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::rc::Weak;

use crate::parser::{NamespaceName, RcPtr};
use crate::strings::CData;

#[cfg(feature = "shared_ns")]
type CDataWeakSet = weak_table::WeakHashSet<Weak<CData>>;

/**
# Shared context for multiple parsers

The context interns the namespace URIs encountered in `xmlns` declarations,
so that each distinct URI is stored once and bindings, resolved names and
attribute keys can refer to it through a cheap [`RcPtr`].

Without the `shared_ns` feature, every parser has its own context and
interning is a plain allocation. With `shared_ns`, a context can be shared
between parsers (via [`Parser::with_context`]); URIs are then kept in a weak
set and dropped lazily once no parser refers to them anymore.

Even though the context is internally mutable, it can safely be shared with
an immutable reference between parsers. If the crate is built with the `mt`
feature, the Context is Send and Sync, otherwise it is neither.

   [`Parser::with_context`]: crate::Parser::with_context
*/
pub struct Context {
	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	nss: Mutex<CDataWeakSet>,
	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	nss: RefCell<CDataWeakSet>,
}

impl Context {
	/// Create a new context
	pub fn new() -> Context {
		Context {
			#[cfg(all(feature = "shared_ns", feature = "mt"))]
			nss: Mutex::new(weak_table::WeakHashSet::new()),
			#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
			nss: RefCell::new(weak_table::WeakHashSet::new()),
		}
	}

	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	fn lock_nss<'a>(&'a self) -> MutexGuard<'a, CDataWeakSet> {
		// a panic while holding the lock cannot leave the set inconsistent
		match self.nss.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	fn lock_nss<'a>(&'a self) -> RefMut<'a, CDataWeakSet> {
		self.nss.borrow_mut()
	}

	/// Intern a namespace URI
	///
	/// The given cdata is interned in the context and a refcounted pointer
	/// is returned. When the last reference to that pointer expires, the
	/// string will be lazily removed from the internal storage.
	pub fn intern_cdata(&self, ns: CData) -> NamespaceName {
		#[cfg(feature = "shared_ns")]
		{
			let mut nss = self.lock_nss();
			return match nss.get(ns.as_str()) {
				Some(ptr) => ptr,
				None => {
					let ptr = RcPtr::new(ns);
					nss.insert(ptr.clone());
					ptr
				}
			};
		}
		#[cfg(not(feature = "shared_ns"))]
		RcPtr::new(ns)
	}

	/// Remove all unreferenced strings from storage and shrink the storage to
	/// fit the requirements.
	pub fn release_temporaries(&self) {
		#[cfg(feature = "shared_ns")]
		{
			let mut nss = self.lock_nss();
			nss.remove_expired();
			nss.shrink_to_fit();
		}
	}

	/// Return the number of namespace URIs interned.
	///
	/// Returns zero if built without `shared_ns`. This count includes strings
	/// which are unreferenced and which would be removed before the next
	/// reallocation.
	pub fn cdatas(&self) -> usize {
		#[cfg(feature = "shared_ns")]
		{
			let nss = self.lock_nss();
			nss.len()
		}
		#[cfg(not(feature = "shared_ns"))]
		0
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Context {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		let mut f = f.debug_struct("Context");
		f.field("instance", &(self as *const Context));
		#[cfg(feature = "shared_ns")]
		{
			let nss = self.lock_nss();
			f.field("nss.capacity()", &nss.capacity())
				.field("nss.length()", &nss.len());
		}
		f.finish()
	}
}
