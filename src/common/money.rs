use std::cmp::Ordering;
use std::fmt;
use std::num::ParseIntError;

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// A struct representing monetary value in the smallest currency unit (e.g., won or cents).
///
/// # Why Use Money? It is a Value Object.
/// Wrapping `u64` keeps amounts and balances from being mixed up with user ids or
/// internal sequence numbers, and the unsigned representation means a balance can
/// never be negative. Arithmetic is checked: callers get `None` on underflow or
/// overflow and decide which error that is.
///
/// # Examples
/// ```
/// use account_ledger::common::money::Money;
///
/// let balance = Money::new(100_000);
/// let after = balance.checked_sub(Money::new(1_000)).unwrap();
/// assert_eq!(after.as_u64(), 99_000);
/// assert!(Money::new(10).checked_sub(Money::new(11)).is_none());
/// ```
pub struct Money(u64);

impl Money {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl From<u64> for Money {
    fn from(value: u64) -> Self {
        Money(value)
    }
}

impl std::str::FromStr for Money {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Money {}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
