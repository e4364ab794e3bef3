use crate::{DrawError, LotteryRule, RngState};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryNumbers {
    /// Distinct, ascending.
    pub white_balls: Vec<u32>,
    pub red_ball: u32,
}

impl fmt::Display for LotteryNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ball) in self.white_balls.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{ball:02}")?;
        }
        write!(f, " | {:02}", self.red_ball)
    }
}

/// Five white balls from 1..=69 and one red ball from 1..=26, all uniform.
pub fn draw_lottery_numbers(rng: &mut RngState) -> LotteryNumbers {
    draw_unchecked(&LotteryRule::default(), rng)
}

pub fn draw_lottery_numbers_with(
    rule: &LotteryRule,
    rng: &mut RngState,
) -> Result<LotteryNumbers, DrawError> {
    rule.validate()?;
    Ok(draw_unchecked(rule, rng))
}

fn draw_unchecked(rule: &LotteryRule, rng: &mut RngState) -> LotteryNumbers {
    let mut white_balls: Vec<u32> = rng
        .sample_distinct(rule.white_max as usize, rule.white_count as usize)
        .into_iter()
        .map(|value| value as u32 + 1)
        .collect();
    white_balls.sort_unstable();
    let red_ball = rng.range_inclusive(1, rule.red_max);
    LotteryNumbers {
        white_balls,
        red_ball,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draw_shape() {
        let mut rng = RngState::from_seed(0xC0FFEE);
        for _ in 0..2_000 {
            let numbers = draw_lottery_numbers(&mut rng);
            assert_eq!(numbers.white_balls.len(), 5);
            assert!(numbers.white_balls.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(numbers.white_balls.iter().all(|ball| (1..=69).contains(ball)));
            assert!((1..=26).contains(&numbers.red_ball));
        }
    }

    #[test]
    fn covers_both_ends_of_the_range() {
        let mut rng = RngState::from_seed(17);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..5_000 {
            let numbers = draw_lottery_numbers(&mut rng);
            seen_low |= numbers.white_balls.contains(&1);
            seen_high |= numbers.white_balls.contains(&69);
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn custom_rule_can_take_every_ball() {
        let rule = LotteryRule {
            white_count: 6,
            white_max: 6,
            red_max: 1,
        };
        let mut rng = RngState::from_seed(5);
        let numbers = draw_lottery_numbers_with(&rule, &mut rng).expect("draw");
        assert_eq!(numbers.white_balls, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(numbers.red_ball, 1);
    }

    #[test]
    fn invalid_rule_is_rejected() {
        let rule = LotteryRule {
            white_count: 7,
            white_max: 6,
            red_max: 1,
        };
        let mut rng = RngState::from_seed(5);
        assert!(draw_lottery_numbers_with(&rule, &mut rng).is_err());
    }

    #[test]
    fn display_pads_to_two_digits() {
        let numbers = LotteryNumbers {
            white_balls: vec![3, 17, 22, 41, 68],
            red_ball: 9,
        };
        assert_eq!(numbers.to_string(), "03 17 22 41 68 | 09");
    }
}
