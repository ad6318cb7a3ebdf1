use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::Serialize;

use crate::models::ReferenceType;

const SCALE: u32 = 4;

/// Statistic exposed by a [`SummaryFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Variance,
    Deviation,
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 7] = [
        FunctionKind::Sum,
        FunctionKind::Mean,
        FunctionKind::Count,
        FunctionKind::Min,
        FunctionKind::Max,
        FunctionKind::Variance,
        FunctionKind::Deviation,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            FunctionKind::Sum => "Σ",
            FunctionKind::Mean => "μ",
            FunctionKind::Count => "№",
            FunctionKind::Min => "↓",
            FunctionKind::Max => "↑",
            FunctionKind::Variance => "σ²",
            FunctionKind::Deviation => "σ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FunctionKind::Sum => "Sum",
            FunctionKind::Mean => "Mean",
            FunctionKind::Count => "Count",
            FunctionKind::Min => "Min",
            FunctionKind::Max => "Max",
            FunctionKind::Variance => "Variance",
            FunctionKind::Deviation => "Deviation",
        }
    }

    /// Display type used to format this statistic for a column of `column_type`.
    pub fn display_type(&self, column_type: ReferenceType) -> ReferenceType {
        match self {
            FunctionKind::Sum | FunctionKind::Min | FunctionKind::Max => column_type,
            FunctionKind::Count => ReferenceType::Integer,
            FunctionKind::Mean | FunctionKind::Variance | FunctionKind::Deviation => {
                ReferenceType::Number
            }
        }
    }
}

/// Single-pass accumulator. Only ever extended through [`SummaryFunction::add_value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryFunction {
    sum: Decimal,
    sum_of_squares: Decimal,
    count: u64,
    min: Option<Decimal>,
    max: Option<Decimal>,
}

impl SummaryFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` is ignored and does not count.
    pub fn add_value(&mut self, value: Option<Decimal>) {
        let Some(value) = value else {
            return;
        };
        self.sum = saturating_add(self.sum, value);
        self.sum_of_squares = saturating_add(self.sum_of_squares, saturating_mul(value, value));
        self.count += 1;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }

    pub fn sum(&self) -> Decimal {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn min(&self) -> Option<Decimal> {
        self.min
    }

    pub fn max(&self) -> Option<Decimal> {
        self.max
    }

    pub fn mean(&self) -> Option<Decimal> {
        if self.count == 0 {
            return None;
        }
        self.sum
            .checked_div(Decimal::from(self.count))
            .map(round_half_up)
    }

    /// `sum_of_squares - sum² / count`, both terms at four decimals. Rounding
    /// of the second term can overshoot on tiny values; the result is
    /// floored at zero.
    pub fn variance(&self) -> Option<Decimal> {
        if self.count == 0 {
            return None;
        }
        let squared = saturating_mul(self.sum, self.sum);
        let correction = round_half_up(squared.checked_div(Decimal::from(self.count))?);
        self.sum_of_squares
            .checked_sub(correction)
            .map(|variance| round_half_up(variance.max(Decimal::ZERO)))
    }

    pub fn deviation(&self) -> Option<Decimal> {
        self.variance()?.sqrt().map(round_half_up)
    }

    /// Statistic by kind; `Sum` and `Count` are always defined.
    pub fn value(&self, kind: FunctionKind) -> Option<Decimal> {
        match kind {
            FunctionKind::Sum => Some(self.sum()),
            FunctionKind::Count => Some(Decimal::from(self.count)),
            FunctionKind::Min => self.min(),
            FunctionKind::Max => self.max(),
            FunctionKind::Mean => self.mean(),
            FunctionKind::Variance => self.variance(),
            FunctionKind::Deviation => self.deviation(),
        }
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn saturating_add(left: Decimal, right: Decimal) -> Decimal {
    left.checked_add(right).unwrap_or(if right.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

fn saturating_mul(left: Decimal, right: Decimal) -> Decimal {
    left.checked_mul(right).unwrap_or(
        if left.is_sign_negative() != right.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        },
    )
}
