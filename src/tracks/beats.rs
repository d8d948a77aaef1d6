/// Note length as an exact fraction of one beat.
/// Arithmetic stays rational; seconds are only computed at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beats {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (2 = half a beat, 3 = a third, etc.)
    pub denominator: u32,
}

impl Beats {
    pub const ONE: Beats = Beats::new(1, 1);
    pub const TWO: Beats = Beats::new(2, 1);
    pub const FOUR: Beats = Beats::new(4, 1);
    pub const HALF: Beats = Beats::new(1, 2);
    pub const QUARTER: Beats = Beats::new(1, 4);

    // Convenience constants for common dotted values
    pub const DOTTED_HALF: Beats = Beats::HALF.dotted();
    pub const DOTTED_ONE: Beats = Beats::ONE.dotted();

    // Three of these fill two beats
    pub const TRIPLET: Beats = Beats::ONE.triplet();

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Apply a dot: multiply by 3/2
    pub const fn dotted(self) -> Self {
        Beats {
            numerator: self.numerator * 3,
            denominator: self.denominator * 2,
        }
    }

    /// Create a triplet: multiply by 2/3
    pub const fn triplet(self) -> Self {
        Beats {
            numerator: self.numerator * 2,
            denominator: self.denominator * 3,
        }
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        if gcd == 0 {
            return self;
        }
        Beats {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Add two lengths (finds common denominator)
    pub const fn add(self, other: Self) -> Self {
        Beats {
            numerator: self.numerator * other.denominator + other.numerator * self.denominator,
            denominator: self.denominator * other.denominator,
        }
        .reduce()
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// Seconds this many beats last at `tempo` beats per minute.
    pub fn to_seconds(&self, tempo: f64) -> f64 {
        (60.0 / tempo) * self.as_f64()
    }
}

impl From<u32> for Beats {
    fn from(beats: u32) -> Self {
        Beats::new(beats, 1)
    }
}

/// Euclidean GCD, used to reduce fractions to lowest terms
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_at_tempo() {
        // At 120 bpm one beat is half a second.
        assert_eq!(Beats::ONE.to_seconds(120.0), 0.5);
        assert_eq!(Beats::HALF.to_seconds(120.0), 0.25);
        assert_eq!(Beats::FOUR.to_seconds(60.0), 4.0);
        assert_eq!(Beats::new(3, 2).to_seconds(60.0), 1.5);
    }

    #[test]
    fn dotted_and_triplet() {
        assert_eq!(Beats::DOTTED_HALF, Beats::new(3, 4));
        assert_eq!(Beats::TRIPLET.reduce(), Beats::new(2, 3));
        // Dotted then triplet lands back where it started.
        assert_eq!(Beats::HALF.dotted().triplet().reduce(), Beats::HALF);
    }

    #[test]
    fn reduce_and_add() {
        assert_eq!(Beats::new(4, 8).reduce(), Beats::new(1, 2));
        assert_eq!(Beats::new(6, 9).reduce(), Beats::new(2, 3));
        assert_eq!(Beats::HALF.add(Beats::QUARTER), Beats::new(3, 4));
        assert_eq!(Beats::new(2, 3).add(Beats::new(1, 3)), Beats::ONE);
    }

    #[test]
    fn const_evaluation() {
        const LEN: Beats = Beats::ONE.dotted().triplet().reduce();
        assert_eq!(LEN, Beats::ONE);
    }
}
