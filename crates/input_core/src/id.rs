/// Identifier of a form control inside a [`ControlStore`](crate::ControlStore).
///
/// Plain `u32` so this crate does not depend on any DOM node id type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u32);

impl ControlId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ControlId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
