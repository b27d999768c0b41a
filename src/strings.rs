/*!
# Strongly-typed strings for use with XML 1.0 documents

This module defines string types which represent pieces of text as they may
occur in XML documents. The types are checked to contain only text which
conforms to the respective grammar production, so that checks done by the
lexer do not have to be repeated by the namespace engine or the application.

## Type Overview

- [`Name`] represents the `Name` production and is used for raw element and
  attribute names before namespace prefix expansion (`prefix:local`).
- [`NCName`] represents the `Name` production without colons; it is used for
  local names and for the prefixes themselves.
- [`CData`] represents strings of XML `Char`s. It is used for attribute
  values, text and namespace URIs.

All three are backed by a [`smartstring::alias::String`], which keeps short
names inline without a heap allocation.

Owned values are constructed using [`std::convert::TryFrom`] from [`str`],
[`String`] and [`smartstring::alias::String`].
*/

use std::borrow::Borrow;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Deref;

use smartstring::alias::String as SmartString;

use nsxml_validation::{validate_cdata, validate_name, validate_ncname};

use crate::error::{NWFError, WFError, ERRCTX_UNKNOWN};

macro_rules! nsxml_string_type {
	(
		$(#[$outer:meta])*
		pub struct $name:ident(SmartString) use $check:ident;
	) => {
		$(#[$outer])*
		#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
		pub struct $name(SmartString);

		impl $name {
			/// Obtain a reference to the inner string slice.
			pub fn as_str(&self) -> &str {
				self.0.as_str()
			}

			/// Extract the inner string and return it.
			pub fn into_inner(self) -> SmartString {
				self.0
			}

			/// Wrap a string which is already known to satisfy the
			/// constraints of the type.
			pub(crate) fn from_validated<T: Into<SmartString>>(s: T) -> Self {
				let s = s.into();
				debug_assert!($check(&s).is_ok());
				Self(s)
			}
		}

		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				self.0.as_str()
			}
		}

		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				self.0.as_str()
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.0.as_str()
			}
		}

		impl PartialEq<str> for $name {
			fn eq(&self, other: &str) -> bool {
				self.0.as_str() == other
			}
		}

		impl PartialEq<&str> for $name {
			fn eq(&self, other: &&str) -> bool {
				self.0.as_str() == *other
			}
		}

		impl PartialEq<$name> for str {
			fn eq(&self, other: &$name) -> bool {
				self == other.0.as_str()
			}
		}

		impl PartialEq<$name> for &str {
			fn eq(&self, other: &$name) -> bool {
				*self == other.0.as_str()
			}
		}

		impl TryFrom<&str> for $name {
			type Error = WFError;

			fn try_from(other: &str) -> Result<Self, Self::Error> {
				$check(other)?;
				Ok(Self(other.into()))
			}
		}

		impl TryFrom<String> for $name {
			type Error = WFError;

			fn try_from(other: String) -> Result<Self, Self::Error> {
				$check(&other)?;
				Ok(Self(other.into()))
			}
		}

		impl TryFrom<SmartString> for $name {
			type Error = WFError;

			fn try_from(other: SmartString) -> Result<Self, Self::Error> {
				$check(&other)?;
				Ok(Self(other))
			}
		}

		impl From<$name> for SmartString {
			fn from(other: $name) -> Self {
				other.0
			}
		}

		impl From<$name> for String {
			fn from(other: $name) -> Self {
				other.0.into()
			}
		}

		impl fmt::Display for $name {
			fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
				f.write_str(self.0.as_str())
			}
		}

		impl fmt::Debug for $name {
			fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
				write!(f, "{}({:?})", stringify!($name), self.0.as_str())
			}
		}
	};
}

fn check_name(s: &str) -> Result<(), WFError> {
	Ok(validate_name(s)?)
}

fn check_ncname(s: &str) -> Result<(), WFError> {
	Ok(validate_ncname(s)?)
}

fn check_cdata(s: &str) -> Result<(), WFError> {
	validate_cdata(s).map_err(|e| match e {
		nsxml_validation::Error::InvalidChar(ch) => {
			WFError::InvalidChar(ERRCTX_UNKNOWN, ch as u32, false)
		}
		other => other.into(),
	})
}

nsxml_string_type! {
	/// String which conforms to the Name production of XML 1.0.
	///
	/// Raw element and attribute names, which may contain a namespace
	/// prefix separated by a colon, are carried as `Name`.
	pub struct Name(SmartString) use check_name;
}

nsxml_string_type! {
	/// String which conforms to the NCName production of Namespaces in XML
	/// 1.0, that is, a [`Name`] without colons.
	pub struct NCName(SmartString) use check_ncname;
}

nsxml_string_type! {
	/// String which consists only of XML 1.0 `Char`s.
	///
	/// References are expanded and CDATA sections are unwrapped by the lexer
	/// before text is turned into `CData`.
	pub struct CData(SmartString) use check_cdata;
}

impl Name {
	/// Split the name at its namespace separator.
	///
	/// Returns the optional prefix and the local name. Fails if the name
	/// contains more than one colon, if a side of the colon is empty or if
	/// the local part does not form a valid NCName.
	///
	/// # Example
	///
	/// ```
	/// use std::convert::TryFrom;
	/// use nsxml::Name;
	///
	/// let name = Name::try_from("foo:bar").unwrap();
	/// let (prefix, local) = name.split_name().unwrap();
	/// assert_eq!(prefix.unwrap(), "foo");
	/// assert_eq!(local, "bar");
	/// ```
	pub fn split_name(&self) -> Result<(Option<NCName>, NCName), NWFError> {
		let raw = self.as_str();
		let mut parts = raw.splitn(3, ':');
		let first = parts.next().unwrap_or("");
		let second = parts.next();
		if parts.next().is_some() {
			return Err(NWFError::MultiColonName(ERRCTX_UNKNOWN, raw.into()));
		}
		match second {
			None => Ok((None, NCName::from_validated(raw))),
			Some(local) => {
				if first.is_empty() || local.is_empty() {
					return Err(NWFError::EmptyNamePart(ERRCTX_UNKNOWN, raw.into()));
				}
				let local = NCName::try_from(local)
					.map_err(|_| NWFError::InvalidLocalName(ERRCTX_UNKNOWN, raw.into()))?;
				Ok((Some(NCName::from_validated(first)), local))
			}
		}
	}
}

impl From<NCName> for Name {
	fn from(other: NCName) -> Self {
		Name(other.0)
	}
}

impl From<NCName> for CData {
	fn from(other: NCName) -> Self {
		CData(other.0)
	}
}

impl From<Name> for CData {
	fn from(other: Name) -> Self {
		CData(other.0)
	}
}
