use super::*;

fn active(fraction: f64, hovered: Option<usize>) -> PointerState {
    PointerState { fraction, hovered }
}

#[test]
fn produces_one_frame_per_card() {
    for n in 0..12 {
        let frames = layout(n, &active(0.3, None), Mode::Active);
        assert_eq!(frames.len(), n);
        let frames = layout(n, &PointerState::resting(), Mode::Resting);
        assert_eq!(frames.len(), n);
    }
}

#[test]
fn empty_deck_yields_empty_output() {
    assert!(layout(0, &active(0.5, Some(0)), Mode::Active).is_empty());
    assert!(layout(0, &PointerState::resting(), Mode::Resting).is_empty());
}

#[test]
fn single_card_is_centered_in_both_modes() {
    for mode in [Mode::Resting, Mode::Active] {
        let frames = layout(1, &active(0.9, Some(0)), mode);
        assert_eq!(frames.len(), 1);
        let frame = frames[0];
        assert_eq!(frame.translate_x, 0.0);
        assert_eq!(frame.translate_y, 0.0);
        assert_eq!(frame.rotate_y, 0.0);
        assert_eq!(frame.rotate_z, 0.0);
        assert_eq!(frame.scale, 1.0);
        assert_eq!(frame.opacity, 1.0);
    }
}

#[test]
fn resting_frames_ignore_pointer_input() {
    let a = layout(5, &active(0.0, None), Mode::Resting);
    let b = layout(5, &active(1.0, Some(3)), Mode::Resting);
    assert_eq!(a, b);
}

#[test]
fn resting_stack_paints_card_zero_on_top() {
    let frames = layout(4, &PointerState::resting(), Mode::Resting);
    for pair in frames.windows(2) {
        assert!(pair[0].z_index > pair[1].z_index);
    }
    assert!(frames.iter().all(|f| f.opacity == 1.0 && f.scale == 1.0));
}

#[test]
fn nearest_card_to_focus_has_max_z_and_scale() {
    for (n, fraction, expected) in [(5, 0.0, 0), (5, 1.0, 4), (5, 0.5, 2), (4, 0.33, 1)] {
        let frames = layout(n, &active(fraction, None), Mode::Active);
        let top = frames
            .iter()
            .max_by_key(|f| f.z_index)
            .expect("non-empty frames");
        assert_eq!(top.index, expected, "n={n} fraction={fraction}");
        let max_scale = frames.iter().map(|f| f.scale).fold(f64::MIN, f64::max);
        assert_eq!(frames[expected].scale, max_scale);
    }
}

#[test]
fn z_index_strictly_decreases_with_distance_from_focus() {
    let frames = layout(7, &active(0.25, None), Mode::Active);
    let focus = 0.25 * 6.0;
    let mut ordered: Vec<&LayoutFrame> = frames.iter().collect();
    ordered.sort_by(|a, b| b.z_index.cmp(&a.z_index));
    for pair in ordered.windows(2) {
        let da = (pair[0].index as f64 - focus).abs();
        let db = (pair[1].index as f64 - focus).abs();
        assert!(
            da < db || (da == db && pair[0].index < pair[1].index),
            "paint order must follow distance from focus"
        );
        assert!(pair[0].z_index > pair[1].z_index);
    }
}

#[test]
fn centered_pointer_over_three_cards_fans_symmetrically() {
    // focus = 1.0: card 1 at distance 0, cards 0 and 2 mirrored at |1|.
    let frames = layout(3, &active(0.5, None), Mode::Active);
    assert_eq!(frames[1].translate_x, 0.0);
    assert_eq!(frames[0].translate_x, -frames[2].translate_x);
    assert!(frames[1].z_index > frames[0].z_index);
    assert!(frames[1].z_index > frames[2].z_index);
    assert!((frames[1].z_index - frames[0].z_index).abs() <= 2);
    assert!(frames[1].scale > frames[0].scale);
    assert_eq!(frames[0].scale, frames[2].scale);
    assert_eq!(frames[0].translate_y, frames[2].translate_y);
    // Equal-distance tie paints the lower index in front.
    assert!(frames[0].z_index > frames[2].z_index);
}

#[test]
fn hovered_card_paints_on_top_at_full_scale() {
    // Hover the far card while the pointer fraction focuses the near end.
    let frames = layout(6, &active(0.1, Some(5)), Mode::Active);
    let top = frames.iter().max_by_key(|f| f.z_index).expect("frames");
    assert_eq!(top.index, 5);
    assert_eq!(frames[5].scale, 1.0);
    assert!(frames[5].translate_z > 0.0);
    assert_eq!(frames[5].opacity, 1.0);
    for frame in frames.iter().filter(|f| f.index != 5) {
        assert!(frame.opacity < 1.0);
        assert!(frame.translate_z <= 0.0);
    }
}

#[test]
fn no_hover_leaves_all_cards_fully_opaque() {
    let frames = layout(4, &active(0.7, None), Mode::Active);
    assert!(frames.iter().all(|f| f.opacity == 1.0));
}

#[test]
fn scale_never_drops_below_floor() {
    let frames = layout(40, &active(0.0, None), Mode::Active);
    assert!(frames.iter().all(|f| f.scale >= 0.6));
}

#[test]
fn fraction_is_clamped_to_unit_interval() {
    let wide = layout(5, &active(7.5, None), Mode::Active);
    let edge = layout(5, &active(1.0, None), Mode::Active);
    assert_eq!(wide, edge);
    let low = layout(5, &active(-3.0, None), Mode::Active);
    let zero = layout(5, &active(0.0, None), Mode::Active);
    assert_eq!(low, zero);
}

#[test]
fn stale_hover_index_is_treated_as_no_hover() {
    let stale = layout(3, &active(0.5, Some(9)), Mode::Active);
    let none = layout(3, &active(0.5, None), Mode::Active);
    assert_eq!(stale, none);
}

#[test]
fn identical_inputs_yield_identical_output() {
    let pointer = active(0.37, Some(2));
    assert_eq!(
        layout(8, &pointer, Mode::Active),
        layout(8, &pointer, Mode::Active)
    );
}
