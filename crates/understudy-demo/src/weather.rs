//! Umbrella advice, synchronous and asynchronous.

use async_trait::async_trait;
use thiserror::Error;
use understudy_core::{Double, DoubleError, Fault, Seam, TargetId};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather station failed: {0}")]
    Station(Fault),

    #[error(transparent)]
    Double(DoubleError),
}

impl From<DoubleError> for WeatherError {
    fn from(err: DoubleError) -> Self {
        match err {
            DoubleError::Thrown(fault) | DoubleError::Rejected(fault) => {
                WeatherError::Station(fault)
            }
            other => WeatherError::Double(other),
        }
    }
}

pub trait Weather: Send + Sync {
    fn is_raining(&self) -> Result<bool, WeatherError>;
}

#[async_trait]
pub trait AsyncWeather: Send + Sync {
    async fn is_raining(&self) -> Result<bool, WeatherError>;
}

/// Shown when the weather cannot be read.
pub const SOMETHING_WENT_WRONG: &str = "something went wrong";

pub struct Person<W> {
    weather: W,
}

impl<W: Weather> Person<W> {
    pub fn new(weather: W) -> Self {
        Self { weather }
    }

    pub fn should_bring_umbrella(&self) -> Result<bool, WeatherError> {
        self.weather.is_raining()
    }

    /// Advice for the user; weather failures become a friendly message.
    pub fn advice(&self) -> &'static str {
        match self.should_bring_umbrella() {
            Ok(true) => "bring an umbrella",
            Ok(false) => "leave the umbrella at home",
            Err(_) => SOMETHING_WENT_WRONG,
        }
    }
}

pub struct AsyncPerson<W> {
    weather: W,
}

impl<W: AsyncWeather> AsyncPerson<W> {
    pub fn new(weather: W) -> Self {
        Self { weather }
    }

    pub async fn should_bring_umbrella(&self) -> Result<bool, WeatherError> {
        self.weather.is_raining().await
    }

    pub async fn advice(&self) -> &'static str {
        match self.should_bring_umbrella().await {
            Ok(true) => "bring an umbrella",
            Ok(false) => "leave the umbrella at home",
            Err(_) => SOMETHING_WENT_WRONG,
        }
    }
}

/// Decides from a sunshine check alone.
pub fn should_bring_umbrella_if<F>(is_sunny: F) -> bool
where
    F: Fn() -> bool,
{
    !is_sunny()
}

/// The real weather station. It never reports rain.
#[derive(Debug, Clone)]
pub struct Station {
    is_raining: Seam<(), bool>,
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

impl Station {
    pub fn new() -> Self {
        Self {
            is_raining: Seam::new(TargetId::new(), "is_raining", |_| false),
        }
    }

    pub fn is_raining_seam(&self) -> &Seam<(), bool> {
        &self.is_raining
    }
}

impl Weather for Station {
    fn is_raining(&self) -> Result<bool, WeatherError> {
        Ok(self.is_raining.call(())?.value_or(false))
    }
}

#[async_trait]
impl AsyncWeather for Station {
    async fn is_raining(&self) -> Result<bool, WeatherError> {
        let reply = self.is_raining.call(())?;
        Ok(reply.settle().await?.unwrap_or(false))
    }
}

impl Weather for Double<(), bool> {
    fn is_raining(&self) -> Result<bool, WeatherError> {
        Ok(self.call(())?.value_or(false))
    }
}

#[async_trait]
impl AsyncWeather for Double<(), bool> {
    async fn is_raining(&self) -> Result<bool, WeatherError> {
        let reply = self.call(())?;
        Ok(reply.settle().await?.unwrap_or(false))
    }
}
