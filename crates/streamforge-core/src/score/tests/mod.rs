// Tests for score types.

mod hard_soft_score;
