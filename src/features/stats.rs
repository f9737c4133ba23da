/// Running summary statistics over a stream of values.
///
/// Standard deviation is the population form (divides by N), matching what
/// numpy's `std` reports for the same samples.
#[derive(Clone, Debug)]
pub struct FeatureStats {
    min: f64,
    max: f64,
    mean: f64,
    std: f64,
    count: u32,
}

impl FeatureStats {
    pub fn new() -> Self {
        Self {
            min: f64::MAX,
            max: f64::MIN,
            mean: 0.0,
            std: 0.0,
            count: 0,
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for value in values {
            stats.add_value(*value);
        }
        stats
    }

    pub fn get_min(&self) -> f64 {
        if self.count > 0 {
            self.min
        } else {
            0.0
        }
    }

    pub fn get_max(&self) -> f64 {
        if self.count > 0 {
            self.max
        } else {
            0.0
        }
    }

    pub fn get_mean(&self) -> f64 {
        self.mean
    }

    pub fn get_std(&self) -> f64 {
        self.std
    }

    #[cfg(test)]
    pub fn get_count(&self) -> u32 {
        self.count
    }

    fn update_mean(&mut self, value: f64) {
        self.mean = (((self.count - 1) as f64 * self.mean) + value) / self.count as f64;
    }

    fn update_std(&mut self, value: f64, old_mean: f64) {
        let variance = (((self.count - 1) as f64 * self.std.powf(2.0))
            + ((value - old_mean) * (value - self.mean)))
            / self.count as f64;
        // Rounding can leave a tiny negative variance for constant input.
        self.std = variance.max(0.0).sqrt();
    }

    fn update_min(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
    }

    fn update_max(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
    }

    pub fn add_value(&mut self, value: f64) {
        self.count += 1;
        self.update_min(value);
        self.update_max(value);
        let old_mean: f64 = self.mean;
        self.update_mean(value);
        self.update_std(value, old_mean);
    }
}

impl Default for FeatureStats {
    fn default() -> Self {
        Self::new()
    }
}

pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Euclidean (L2) norm.
pub fn l2_norm(values: &[f64]) -> f64 {
    sum_of_squares(values).sqrt()
}
