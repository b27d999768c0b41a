/*!
Context strings for error messages.

The constants are passed around as `&'static str` and end up in the
`Display` output of the errors. Their exact wording is not part of the API.
*/

pub const ERRCTX_UNKNOWN: &'static str = "in unknown context";
pub const ERRCTX_TEXT: &'static str = "in text";
pub const ERRCTX_NAME: &'static str = "in element";
pub const ERRCTX_ATTNAME: &'static str = "in attribute";
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
pub const ERRCTX_ELEMENT: &'static str = "in element header";
pub const ERRCTX_ELEMENT_FOOT: &'static str = "in element footer";
pub const ERRCTX_NSDECL: &'static str = "in namespace declaration";
pub const ERRCTX_CDATA_SECTION: &'static str = "in CDATA section";
pub const ERRCTX_COMMENT: &'static str = "in comment";
pub const ERRCTX_PI: &'static str = "in processing instruction";
pub const ERRCTX_DOCBEGIN: &'static str = "before root element";
pub const ERRCTX_DOCEND: &'static str = "after root element";
