use super::Rgba;

/// Class colours, reused cyclically past the fifth class.
pub const PALETTE: [Rgba; 5] = [
    Rgba::rgb(0, 255, 255),
    Rgba::rgb(255, 165, 0),
    Rgba::rgb(50, 205, 50),
    Rgba::rgb(255, 0, 255),
    Rgba::rgb(255, 255, 0),
];

/// Alpha of the decision regions.
pub const REGION_ALPHA: u8 = 100;

pub fn class_color(class: usize) -> Rgba {
    PALETTE[class % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn distinct_up_to_five_then_cycles() {
        let first = (0..5).map(class_color).collect::<HashSet<_>>();
        assert_eq!(first.len(), 5);

        for class in 0..40 {
            assert_eq!(class_color(class), class_color(class % 5));
        }
        assert_eq!(class_color(5), class_color(0));
    }
}
