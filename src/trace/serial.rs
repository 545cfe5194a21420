/// A wrapping change counter.
///
/// Dependents remember the value they last saw and compare for equality only; ordering
/// between two serials carries no meaning once the counter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Serial(u32);

impl Serial {
    pub fn new() -> Self {
        Serial(0)
    }

    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}
