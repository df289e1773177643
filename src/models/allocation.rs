/// Target spend shares for one month under the 50/30/20 model.
///
/// Always holds three integer percentages in `0..=100` that sum to exactly
/// 100. The only ways to build one are the checked [`Allocation::from_parts`]
/// and the normalizer functions in `crate::allocation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Allocation {
    needs: u8,
    wants: u8,
    savings: u8,
}

impl Allocation {
    pub(crate) const DEFAULT: Allocation = Allocation {
        needs: 50,
        wants: 30,
        savings: 20,
    };

    /// Build from already-valid parts. Returns `None` if any part is over
    /// 100 or the parts do not sum to 100.
    pub(crate) fn from_parts(needs: u8, wants: u8, savings: u8) -> Option<Self> {
        let sum = u16::from(needs) + u16::from(wants) + u16::from(savings);
        if needs <= 100 && wants <= 100 && savings <= 100 && sum == 100 {
            Some(Self {
                needs,
                wants,
                savings,
            })
        } else {
            None
        }
    }

    pub(crate) fn needs(&self) -> u8 {
        self.needs
    }

    pub(crate) fn wants(&self) -> u8 {
        self.wants
    }

    pub(crate) fn savings(&self) -> u8 {
        self.savings
    }

    pub(crate) fn get(&self, slot: Slot) -> u8 {
        match slot {
            Slot::Needs => self.needs,
            Slot::Wants => self.wants,
            Slot::Savings => self.savings,
        }
    }

    /// Values in slot order: needs, wants, savings.
    pub(crate) fn as_array(&self) -> [u8; 3] {
        [self.needs, self.wants, self.savings]
    }

    /// Cumulative cut points on a 0..=100 bar: `(needs, needs + wants)`.
    pub(crate) fn boundaries(&self) -> (u8, u8) {
        (self.needs, self.needs + self.wants)
    }
}

impl Default for Allocation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "needs {}% / wants {}% / savings {}%",
            self.needs, self.wants, self.savings
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Needs,
    Wants,
    Savings,
}

impl Slot {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
            Self::Savings => "savings",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "needs" | "need" | "n" => Some(Self::Needs),
            "wants" | "want" | "w" => Some(Self::Wants),
            "savings" | "saving" | "s" => Some(Self::Savings),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [Slot] {
        &[Self::Needs, Self::Wants, Self::Savings]
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Needs => 0,
            Self::Wants => 1,
            Self::Savings => 2,
        }
    }

    /// The two other slots, in slot order.
    pub(crate) fn others(&self) -> (Slot, Slot) {
        match self {
            Self::Needs => (Self::Wants, Self::Savings),
            Self::Wants => (Self::Needs, Self::Savings),
            Self::Savings => (Self::Needs, Self::Wants),
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
