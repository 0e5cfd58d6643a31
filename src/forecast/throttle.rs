use std::time::Duration;

/// Fixed pause between consecutive provider calls.
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    waits: usize,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay, waits: 0 }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of pauses taken so far.
    pub fn waits(&self) -> usize {
        self.waits
    }

    pub async fn wait(&mut self) {
        self.waits += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn each_wait_sleeps_for_the_delay() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        let started = Instant::now();

        throttle.wait().await;
        throttle.wait().await;

        assert_eq!(throttle.waits(), 2);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
