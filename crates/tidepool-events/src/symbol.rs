/// Stable, compile-time-sized identifier for a tracked instrument.
///
/// `repr(transparent)` ensures the struct has the same memory layout as its
/// single field, so `SymbolId` is as cheap to pass around as a `u16`. Using a
/// tuple struct (newtype pattern) instead of a bare `u16` keeps symbol
/// indices from being accidentally mixed up with other integer counts.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SymbolId(pub u16);

impl SymbolId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
