use derive_more::Display;

#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PlaybackRate {
    #[display("0.5x")]
    Half,
    #[default]
    #[display("1x")]
    Normal,
    #[display("2x")]
    Double,
    #[display("5x")]
    Five,
    #[display("10x")]
    Ten,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 5] = [
        PlaybackRate::Half,
        PlaybackRate::Normal,
        PlaybackRate::Double,
        PlaybackRate::Five,
        PlaybackRate::Ten,
    ];

    pub fn factor(self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::Double => 2.0,
            PlaybackRate::Five => 5.0,
            PlaybackRate::Ten => 10.0,
        }
    }

    /// Next rate up, saturating at 10x.
    pub fn faster(self) -> Self {
        let index = self.index();
        Self::ALL[(index + 1).min(Self::ALL.len() - 1)]
    }

    /// Next rate down, saturating at 0.5x.
    pub fn slower(self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|rate| *rate == self)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_saturate_at_both_ends() {
        assert_eq!(PlaybackRate::Ten.faster(), PlaybackRate::Ten);
        assert_eq!(PlaybackRate::Half.slower(), PlaybackRate::Half);
        assert_eq!(PlaybackRate::Normal.faster(), PlaybackRate::Double);
        assert_eq!(PlaybackRate::Five.slower().factor(), 2.0);
        assert_eq!(PlaybackRate::Half.to_string(), "0.5x");
    }
}
