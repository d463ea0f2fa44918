use serde::{Deserialize, Serialize};

use super::types::RegionId;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Twelve calendar-month figures plus their annual mean.
///
/// `None` marks an undefined figure: a month with no data in the window, or
/// a percent change against a zero baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProfile {
    pub months: [Option<f64>; 12],
    pub annual: Option<f64>,
}

impl MonthlyProfile {
    /// Build from monthly figures; the annual figure is the simple mean of
    /// the months that are present.
    pub fn from_months(months: [Option<f64>; 12]) -> Self {
        let present: Vec<f64> = months.iter().flatten().copied().collect();
        let annual = if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        };
        Self { months, annual }
    }

    /// Element-wise combination; `None` if either side is `None` or `f` yields `None`.
    ///
    /// The annual figure applies `f` to the means of both sides taken over
    /// the months defined in both, so uneven month coverage cannot shift it.
    pub fn combine(
        &self,
        other: &MonthlyProfile,
        f: impl Fn(f64, f64) -> Option<f64>,
    ) -> MonthlyProfile {
        let pair = |a: Option<f64>, b: Option<f64>| a.zip(b).and_then(|(a, b)| f(a, b));
        let mut months = [None; 12];
        for (i, month) in months.iter_mut().enumerate() {
            *month = pair(self.months[i], other.months[i]);
        }

        let common: Vec<(f64, f64)> = self
            .months
            .iter()
            .zip(other.months.iter())
            .filter_map(|(a, b)| a.zip(*b))
            .collect();
        let annual = if common.is_empty() {
            None
        } else {
            let n = common.len() as f64;
            let (sum_a, sum_b) = common
                .iter()
                .fold((0.0, 0.0), |(sa, sb), (a, b)| (sa + a, sb + b));
            f(sum_a / n, sum_b / n)
        };

        MonthlyProfile { months, annual }
    }

    /// Month figures followed by the annual figure
    pub fn columns(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.months.iter().copied().chain(std::iter::once(self.annual))
    }
}

/// `recent - baseline`
pub fn absolute_change(baseline: f64, recent: f64) -> Option<f64> {
    Some(recent - baseline)
}

/// `(recent - baseline) / baseline * 100`, undefined for a zero baseline
pub fn percent_change(baseline: f64, recent: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    let pct = (recent - baseline) / baseline * 100.0;
    pct.is_finite().then_some(pct)
}

/// Baseline vs recent predicted demand for one region (GW)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub region: RegionId,
    pub baseline: MonthlyProfile,
    pub recent: MonthlyProfile,
    pub absolute_change: MonthlyProfile,
    pub percent_change: MonthlyProfile,
}

impl ChangeReport {
    pub fn new(region: RegionId, baseline: MonthlyProfile, recent: MonthlyProfile) -> Self {
        let absolute_change = baseline.combine(&recent, absolute_change);
        let percent_change = baseline.combine(&recent, percent_change);
        Self {
            region,
            baseline,
            recent,
            absolute_change,
            percent_change,
        }
    }
}

/// Baseline vs recent mean annual wholesale cost for one region (USD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub region: RegionId,
    pub baseline_usd: f64,
    pub recent_usd: f64,
    pub change_usd: f64,
    pub percent_change: Option<f64>,
    pub baseline_years: usize,
    pub recent_years: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(value: f64) -> MonthlyProfile {
        MonthlyProfile::from_months([Some(value); 12])
    }

    #[test]
    fn test_annual_is_mean_of_present_months() {
        let mut months = [None; 12];
        months[0] = Some(10.0);
        months[6] = Some(20.0);
        let p = MonthlyProfile::from_months(months);
        assert_eq!(p.annual, Some(15.0));

        let empty = MonthlyProfile::from_months([None; 12]);
        assert_eq!(empty.annual, None);
    }

    #[test]
    fn test_change_report() {
        let report = ChangeReport::new(RegionId::from("SPP"), profile(40.0), profile(42.0));
        assert_eq!(report.absolute_change.months[3], Some(2.0));
        assert_eq!(report.absolute_change.annual, Some(2.0));
        assert_eq!(report.percent_change.months[3], Some(5.0));
        assert_eq!(report.percent_change.annual, Some(5.0));
    }

    #[test]
    fn test_percent_change_undefined_for_zero_baseline() {
        assert_eq!(percent_change(0.0, 5.0), None);
        assert_eq!(percent_change(0.0, 0.0), None);

        let mut months = [Some(10.0); 12];
        months[1] = Some(0.0);
        let baseline = MonthlyProfile::from_months(months);
        let report = ChangeReport::new(RegionId::from("ISONE"), baseline, profile(10.0));
        assert_eq!(report.percent_change.months[1], None);
        assert_eq!(report.percent_change.months[0], Some(0.0));
        assert_eq!(report.absolute_change.months[1], Some(10.0));
    }

    #[test]
    fn test_annual_change_uses_common_months() {
        let mut baseline = [None; 12];
        baseline[0] = Some(10.0);
        baseline[6] = Some(40.0);
        let mut recent = [None; 12];
        recent[0] = Some(10.0);

        let report = ChangeReport::new(
            RegionId::from("CAISO"),
            MonthlyProfile::from_months(baseline),
            MonthlyProfile::from_months(recent),
        );

        assert_eq!(report.baseline.annual, Some(25.0));
        assert_eq!(report.recent.annual, Some(10.0));
        assert_eq!(report.absolute_change.months[0], Some(0.0));
        assert_eq!(report.absolute_change.months[6], None);
        assert_eq!(report.absolute_change.annual, Some(0.0));
        assert_eq!(report.percent_change.annual, Some(0.0));
    }

    #[test]
    fn test_annual_change_undefined_without_common_months() {
        let mut baseline = [None; 12];
        baseline[0] = Some(10.0);
        let mut recent = [None; 12];
        recent[5] = Some(12.0);

        let report = ChangeReport::new(
            RegionId::from("NYISO"),
            MonthlyProfile::from_months(baseline),
            MonthlyProfile::from_months(recent),
        );
        assert_eq!(report.absolute_change.annual, None);
        assert_eq!(report.percent_change.annual, None);
    }

    #[test]
    fn test_columns_order() {
        let p = profile(1.0);
        let cols: Vec<_> = p.columns().collect();
        assert_eq!(cols.len(), 13);
        assert_eq!(MONTH_NAMES.len(), 12);
    }
}
