// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

/// Nonzero counts collected at each stage of the forward and transposed
/// solves, and the smoothed ratios the U strategy selection works from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorStats {
    /// Counts are only accumulated while this is set.
    pub collect: bool,

    pub number_ftran_counts: usize,
    pub ftran_count_input: f64,
    pub ftran_count_after_l: f64,
    pub ftran_count_after_r: f64,
    pub ftran_count_after_u: f64,

    pub number_btran_counts: usize,
    pub btran_count_input: f64,
    pub btran_count_after_u: f64,
    pub btran_count_after_r: f64,
    pub btran_count_after_l: f64,

    /// Average growth of the nonzero count through each stage.
    pub ftran_average_after_l: f64,
    pub ftran_average_after_r: f64,
    pub ftran_average_after_u: f64,
    pub btran_average_after_u: f64,
    pub btran_average_after_r: f64,
    pub btran_average_after_l: f64,
}

/// Number of solves after which the counts are trusted.
const MIN_COUNTS: usize = 100;
/// Weight kept by old counts at each refactorization.
const DECAY: f64 = 0.8;

impl FactorStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Turn the counts into averages and age them. Called when new factors
    /// are loaded.
    pub(crate) fn roll(&mut self) {
        if self.number_ftran_counts > MIN_COUNTS {
            self.ftran_count_input = self.ftran_count_input.max(1.0);
            self.ftran_average_after_l =
                ratio(self.ftran_count_after_l, self.ftran_count_input);
            self.ftran_average_after_r =
                ratio(self.ftran_count_after_r, self.ftran_count_after_l);
            self.ftran_average_after_u =
                ratio(self.ftran_count_after_u, self.ftran_count_after_r);
        }
        if self.number_btran_counts > MIN_COUNTS {
            if self.btran_count_input > 0.0
                && self.btran_count_after_u > 0.0
                && self.btran_count_after_r > 0.0
            {
                self.btran_average_after_u =
                    ratio(self.btran_count_after_u, self.btran_count_input);
                self.btran_average_after_r =
                    ratio(self.btran_count_after_r, self.btran_count_after_u);
                self.btran_average_after_l =
                    ratio(self.btran_count_after_l, self.btran_count_after_r);
            } else {
                self.btran_average_after_u = 1.0;
                self.btran_average_after_r = 1.0;
                self.btran_average_after_l = 1.0;
            }
        }

        for count in [
            &mut self.ftran_count_input,
            &mut self.ftran_count_after_l,
            &mut self.ftran_count_after_r,
            &mut self.ftran_count_after_u,
            &mut self.btran_count_input,
            &mut self.btran_count_after_u,
            &mut self.btran_count_after_r,
            &mut self.btran_count_after_l,
        ] {
            *count *= DECAY;
        }
        self.number_ftran_counts = (self.number_ftran_counts as f64 * DECAY) as usize;
        self.number_btran_counts = (self.number_btran_counts as f64 * DECAY) as usize;
    }
}

fn ratio(after: f64, before: f64) -> f64 {
    if before > 0.0 {
        (after / before).max(1.0)
    } else {
        1.0
    }
}
