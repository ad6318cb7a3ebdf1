use serde::Serialize;

use crate::value::CellValue;

use super::summary::{FunctionKind, SummaryFunction};

/// What `Cell::display` yields while no display string has been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFallback {
    /// Stringified raw value.
    #[default]
    RawValue,
    Empty,
}

/// Formatted statistics of the accumulator attached to a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionDisplay {
    pub sum: Option<String>,
    pub mean: Option<String>,
    pub count: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub variance: Option<String>,
    pub deviation: Option<String>,
}

impl FunctionDisplay {
    pub fn get(&self, kind: FunctionKind) -> Option<&str> {
        match kind {
            FunctionKind::Sum => self.sum.as_deref(),
            FunctionKind::Mean => self.mean.as_deref(),
            FunctionKind::Count => self.count.as_deref(),
            FunctionKind::Min => self.min.as_deref(),
            FunctionKind::Max => self.max.as_deref(),
            FunctionKind::Variance => self.variance.as_deref(),
            FunctionKind::Deviation => self.deviation.as_deref(),
        }
    }

    pub fn set(&mut self, kind: FunctionKind, display: Option<String>) {
        let slot = match kind {
            FunctionKind::Sum => &mut self.sum,
            FunctionKind::Mean => &mut self.mean,
            FunctionKind::Count => &mut self.count,
            FunctionKind::Min => &mut self.min,
            FunctionKind::Max => &mut self.max,
            FunctionKind::Variance => &mut self.variance,
            FunctionKind::Deviation => &mut self.deviation,
        };
        *slot = display;
    }
}

/// One reported value.
///
/// Equality looks at the raw value only. A null cell is never equal to
/// anything, including another null cell, so `Cell` is deliberately not `Eq`.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub value: CellValue,
    pub display_value: Option<String>,
    pub fallback: DisplayFallback,
    pub color: Option<String>,
    pub style: Option<String>,
    /// Owning table when `value` identifies a foreign entity.
    pub table_name: Option<String>,
    pub function: Option<SummaryFunction>,
    pub function_display: FunctionDisplay,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display_value = Some(display.into());
        self
    }

    pub fn with_fallback(mut self, fallback: DisplayFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_function(mut self, function: SummaryFunction) -> Self {
        self.function = Some(function);
        self
    }

    /// Never absent: falls back per [`DisplayFallback`].
    pub fn display(&self) -> String {
        match &self.display_value {
            Some(display) => display.clone(),
            None => match self.fallback {
                DisplayFallback::RawValue => self.value.to_string(),
                DisplayFallback::Empty => String::new(),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn function_value(&self, kind: FunctionKind) -> Option<rust_decimal::Decimal> {
        self.function.as_ref().and_then(|f| f.value(kind))
    }

    pub fn function_display_value(&self, kind: FunctionKind) -> Option<&str> {
        self.function_display.get(kind)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        !self.value.is_null() && self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_falls_back_to_raw_value() {
        let cell = Cell::new(42i64);
        assert_eq!(cell.display(), "42");
        let cell = Cell::new(42i64).with_fallback(DisplayFallback::Empty);
        assert_eq!(cell.display(), "");
        let cell = Cell::new(42i64).with_display("forty-two");
        assert_eq!(cell.display(), "forty-two");
        assert_eq!(Cell::null().display(), "");
    }

    #[test]
    fn equality_uses_raw_value_only() {
        let a = Cell::new("EU").with_display("Europe");
        let b = Cell::new("EU").with_display("Europa");
        assert_eq!(a, b);
        assert_ne!(Cell::new("EU"), Cell::new("US"));
    }

    #[test]
    fn null_cells_are_never_equal() {
        let a = Cell::null();
        let b = Cell::null();
        assert_ne!(a, b);
        assert_ne!(a.clone(), a);
    }

    #[test]
    fn function_values_come_from_accumulator() {
        let mut f = SummaryFunction::new();
        f.add_value(Some(rust_decimal::Decimal::from(3)));
        let cell = Cell::new(rust_decimal::Decimal::from(3)).with_function(f);
        assert_eq!(
            cell.function_value(FunctionKind::Count),
            Some(rust_decimal::Decimal::ONE)
        );
        assert_eq!(cell.function_display_value(FunctionKind::Sum), None);
        assert_eq!(Cell::null().function_value(FunctionKind::Sum), None);
    }
}
