use review_carousel::config::CardOptions;
use review_carousel::review::{ReviewRecord, default_reviews};
use review_carousel::texture::testkit::BlockFace;
use review_carousel::texture::{CardTextureGenerator, parse_hex_color};

fn generator(options: &CardOptions, scale: f32) -> CardTextureGenerator {
    CardTextureGenerator::new(options, scale, Box::new(BlockFace))
}

#[test]
fn long_review_is_cut_to_four_lines_with_ellipsis() {
    let generator = generator(&CardOptions::default(), 1.0);
    let max_width = generator.style().body_max_width();
    assert_eq!(max_width, 600.0);

    for review in default_reviews() {
        let lines = generator.body_lines(&review.text);
        assert_eq!(lines.len(), 4, "{}", review.company);
        let last = lines.last().unwrap();
        assert!(last.ends_with("..."), "{last:?}");
        for line in &lines {
            assert!(generator.measure_body(line) <= max_width, "{line:?} too wide");
        }
    }
}

#[test]
fn short_review_keeps_its_words() {
    let generator = generator(&CardOptions::default(), 1.0);
    let lines = generator.body_lines("Beautiful glazes and quick delivery.");
    assert_eq!(lines.join(" "), "Beautiful glazes and quick delivery.");
    assert!(lines.iter().all(|line| !line.ends_with("...")));
}

#[test]
fn max_lines_option_is_honoured() {
    let options = CardOptions {
        max_lines: 2,
        ..CardOptions::default()
    };
    let generator = generator(&options, 1.0);
    let lines = generator.body_lines(&default_reviews()[0].text);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("..."));
}

#[test]
fn bitmap_is_card_size_times_scale() {
    for (scale, expected) in [(1.0, (700, 450)), (1.5, (1050, 675)), (2.0, (1400, 900))] {
        let mut generator = generator(&CardOptions::default(), scale);
        let texture = generator.render(&ReviewRecord::new("Studio", 4, "Lovely pieces."));
        assert_eq!((texture.width(), texture.height()), expected);
        assert_eq!(
            texture.pixels().len(),
            (expected.0 * expected.1 * 4) as usize
        );
    }
}

#[test]
fn every_card_is_painted_fresh() {
    let mut generator = generator(&CardOptions::default(), 1.0);
    let a = generator.render(&ReviewRecord::new("Alpha", 5, "One kind of praise."));
    let b = generator.render(&ReviewRecord::new("Omega Works Ltd", 1, "Another."));
    assert_eq!(generator.generated(), 2);
    assert_ne!(a.pixels(), b.pixels());
}

#[test]
fn body_colour_reaches_the_bitmap() {
    let mut options = CardOptions::default();
    options.colors.body = "#ff0000".into();
    let mut generator = generator(&options, 1.0);
    let texture = generator.render(&ReviewRecord::new("Red", 3, "WWWWWWWW"));
    let style = generator.style();
    // Inside the first block glyph of the first body line.
    let x = (style.body_x + style.body_px * 0.25).round() as u32;
    let y = (style.body_top + style.body_px * 0.5).round() as u32;
    let pixel = texture.image().get_pixel(x, y);
    assert!(pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60, "{pixel:?}");
}

#[test]
fn bad_colour_falls_back_to_default() {
    let mut options = CardOptions::default();
    options.colors.border = "not-a-colour".into();
    let generator = generator(&options, 1.0);
    assert_eq!(Some(generator.style().border), parse_hex_color("#334155"));
}
