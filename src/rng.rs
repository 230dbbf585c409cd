//! Seeded linear-congruential generator used for every shuffle in the
//! tournament, so a given seed reproduces a draw exactly.

#[derive(Clone, Debug)]
pub struct Lcg {
  state: u32,
}

impl Lcg {
  pub fn new(seed: u32) -> Self {
    Lcg { state: seed }
  }

  /// Seeded when the host supplies one, OS-random otherwise.
  pub fn from_optional(seed: Option<u32>) -> Self {
    Lcg::new(seed.unwrap_or_else(os_seed))
  }

  pub fn next_u32(&mut self) -> u32 {
    self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    self.state
  }

  /// Uniform in `[0, 1)`.
  pub fn next_f64(&mut self) -> f64 {
    self.next_u32() as f64 / 4_294_967_296.0
  }

  /// Fisher-Yates from the back.
  pub fn shuffle<T>(&mut self, items: &mut [T]) {
    for i in (1..items.len()).rev() {
      let j = (self.next_f64() * (i + 1) as f64) as usize;
      items.swap(i, j.min(i));
    }
  }
}

pub fn os_seed() -> u32 {
  rand::random::<u32>()
}
