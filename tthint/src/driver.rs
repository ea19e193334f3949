//! Entry point shared by all sizes of all fonts.

use read_fonts::{tables::glyf::PointFlags, types::Point};

use super::{
    error::HintingError,
    font::FontPrograms,
    options::HintingOptions,
    size::{HintOutcome, SizeProgramCache},
    zone::GlyphZone,
};

/// Owns the glyph zone that is reused for every glyph and creates the
/// per size caches.
///
/// The zone grows to fit the largest glyph seen so far and is never
/// shrunk, so steady state hinting does not allocate.
#[derive(Clone, Default, Debug)]
pub struct Driver {
    zone: GlyphZone,
    options: HintingOptions,
}

impl Driver {
    pub fn new(options: HintingOptions) -> Self {
        Self {
            zone: GlyphZone::default(),
            options,
        }
    }

    pub fn options(&self) -> &HintingOptions {
        &self.options
    }

    /// Sets the options used for caches created after this call.
    pub fn set_options(&mut self, options: HintingOptions) {
        self.options = options;
    }

    /// Returns the shared glyph zone, reset to hold a glyph with the given
    /// number of points and contours.
    pub fn glyph_zone(
        &mut self,
        point_count: usize,
        contour_count: usize,
    ) -> Result<&mut GlyphZone, HintingError> {
        self.zone.reset(point_count, contour_count)?;
        Ok(&mut self.zone)
    }

    /// Creates a cache for the hinting programs of `font`.
    pub fn new_size<'a>(&self, font: FontPrograms<'a>) -> Result<SizeProgramCache<'a>, HintingError> {
        SizeProgramCache::new(font, self.options)
    }

    /// Loads an outline in font units into the shared zone, scales it to
    /// the size prepared in `size` and runs the glyph program.
    ///
    /// Returns the outcome along with the zone holding the final points.
    /// Fails with [`HintingError::SizeNotReady`] if
    /// [`ensure_ready`](SizeProgramCache::ensure_ready) has not been called
    /// on `size`; the zone is left as it was.
    pub fn hint_outline(
        &mut self,
        size: &mut SizeProgramCache,
        unscaled: &[Point<i32>],
        flags: &[PointFlags],
        contours: &[u16],
        bytecode: &[u8],
        is_composite: bool,
    ) -> Result<(HintOutcome, &GlyphZone), HintingError> {
        let scale = size
            .metrics()
            .ok_or(HintingError::SizeNotReady)?
            .scale();
        self.zone.load(unscaled, flags, contours)?;
        self.zone.scale(scale);
        let outcome = size.hint_glyph(&mut self.zone, bytecode, is_composite)?;
        Ok((outcome, &self.zone))
    }

    /// Frees the memory held by the shared zone.
    pub fn release(&mut self) {
        self.zone.release();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read_fonts::{tables::glyf::PointFlags, types::Point, FontRef};

    use super::{
        super::{
            cvt::SizeRequest,
            error::HintingError,
            font::{tests::TestFont, FontPrograms},
            options::HintingOptions,
            size::HintOutcome,
        },
        Driver,
    };

    #[test]
    fn glyph_zone_grows_and_is_reused() {
        let mut driver = Driver::new(HintingOptions::default());
        let zone = driver.glyph_zone(8, 2).unwrap();
        assert_eq!((zone.point_count(), zone.contour_count()), (8, 2));
        let zone = driver.glyph_zone(3, 1).unwrap();
        assert_eq!((zone.point_count(), zone.contour_count()), (3, 1));
        let (points, contours) = zone.capacity();
        assert!(points >= 8 && contours >= 2);
        driver.release();
        assert_eq!(driver.glyph_zone(0, 0).unwrap().capacity(), (0, 0));
    }

    #[test]
    fn sizes_share_the_glyph_zone() {
        let _ = env_logger::builder().is_test(true).try_init();
        // PUSHB[1] 0 100, WCVTP
        let small = TestFont {
            prep: vec![0xB1, 0, 100, 0x44],
            cvt: vec![0],
            units_per_em: 640,
            ..Default::default()
        }
        .build();
        let large = TestFont {
            cvt: vec![320],
            units_per_em: 640,
            ..Default::default()
        }
        .build();
        let small = FontRef::new(&small).unwrap();
        let large = FontRef::new(&large).unwrap();
        let mut driver = Driver::new(HintingOptions::default());
        let mut small = driver.new_size(FontPrograms::new(&small).unwrap()).unwrap();
        let mut large = driver.new_size(FontPrograms::new(&large).unwrap()).unwrap();
        small.ensure_ready(SizeRequest::new(10)).unwrap();
        large.ensure_ready(SizeRequest::new(20)).unwrap();
        // SVTCA[y], PUSHB[1] 0 0, RCVT, SCFS
        let program = [0x00, 0xB1, 0, 0, 0x45, 0x48];
        let outline = [Point::new(0, 0), Point::new(640, 640)];
        let flags = [PointFlags::on_curve(); 2];
        let (outcome, zone) = driver
            .hint_outline(&mut small, &outline, &flags, &[1], &program, false)
            .unwrap();
        assert_eq!(outcome, HintOutcome::Hinted);
        assert_eq!(zone.points(), [Point::new(0, 100), Point::new(640, 640)]);
        let (outcome, zone) = driver
            .hint_outline(&mut large, &outline, &flags, &[1], &program, false)
            .unwrap();
        assert_eq!(outcome, HintOutcome::Hinted);
        // 320 units at 20 ppem and 640 upem
        assert_eq!(zone.points(), [Point::new(0, 640), Point::new(1280, 1280)]);
    }

    #[test]
    fn unprepared_size_is_an_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = TestFont {
            cvt: vec![0],
            units_per_em: 640,
            ..Default::default()
        }
        .build();
        let font = FontRef::new(&data).unwrap();
        let mut driver = Driver::new(HintingOptions::default());
        let mut ready = driver.new_size(FontPrograms::new(&font).unwrap()).unwrap();
        let mut unprepared = driver.new_size(FontPrograms::new(&font).unwrap()).unwrap();
        ready.ensure_ready(SizeRequest::new(10)).unwrap();
        let outline = [Point::new(0, 0), Point::new(640, 640)];
        let flags = [PointFlags::on_curve(); 3];
        let (outcome, _) = driver
            .hint_outline(&mut ready, &outline, &flags[..2], &[1], &[], false)
            .unwrap();
        assert_eq!(outcome, HintOutcome::Hinted);
        // Scaling by zero would collapse the outline to the origin
        let result = driver.hint_outline(
            &mut unprepared,
            &[Point::new(0, 0), Point::new(320, 0), Point::new(320, 320)],
            &flags,
            &[2],
            &[],
            false,
        );
        assert_eq!(
            result.map(|(outcome, _)| outcome),
            Err(HintingError::SizeNotReady)
        );
        // The previous glyph is still in the zone
        assert_eq!(driver.zone.points(), [Point::new(0, 0), Point::new(640, 640)]);
    }
}
