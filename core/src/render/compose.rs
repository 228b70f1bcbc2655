use crate::prelude::{HeatmapError, HeatmapResult, StageConfig};
use crate::processing::aggregate::MetricColumn;
use crate::processing::grid::GridField;
use crate::render::colormap::{ColorMapper, Normalizer};
use ab_glyph::{FontArc, PxScale};
use image::{imageops, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Pixel geometry of one output canvas.
///
/// The plot area is exactly the floor-plan extent, one canvas pixel per image pixel,
/// offset below the title band. The colour bar lives in a strip to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub plot_x: u32,
    pub plot_y: u32,
    pub plot_width: u32,
    pub plot_height: u32,
    pub colorbar: Option<(u32, u32, u32, u32)>,
}

impl PlotLayout {
    pub fn for_image(width: u32, height: u32, config: &StageConfig) -> Self {
        let colorbar = if config.colorbar_band >= 8 {
            let bar_width = (config.colorbar_band / 4).max(4);
            let bar_height = (height * 8 / 10).max(1);
            Some((
                width + config.colorbar_band / 8,
                config.title_band + (height - bar_height) / 2,
                bar_width,
                bar_height,
            ))
        } else {
            None
        };

        Self {
            canvas_width: width + config.colorbar_band,
            canvas_height: height + config.title_band,
            plot_x: 0,
            plot_y: config.title_band,
            plot_width: width,
            plot_height: height,
            colorbar,
        }
    }
}

/// Composites background, heat overlay, colour bar, sample markers and title.
pub struct Renderer<'a> {
    config: &'a StageConfig,
    font: Option<&'a FontArc>,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a StageConfig, font: Option<&'a FontArc>) -> Self {
        Self { config, font }
    }

    pub fn layout(&self, background: &RgbaImage) -> PlotLayout {
        PlotLayout::for_image(background.width(), background.height(), self.config)
    }

    /// Renders one metric.
    ///
    /// The overlay and colour bar use the field's own range; markers use the padded
    /// metric sequence and each point's measured value.
    pub fn render(
        &self,
        background: &RgbaImage,
        field: &GridField,
        column: &MetricColumn<'_>,
        title: &str,
    ) -> HeatmapResult<RgbaImage> {
        let layout = self.layout(background);
        self.check_extent(background, field)?;

        let field_mapper = ColorMapper::new(Normalizer::from_field(field)?);
        let point_mapper = ColorMapper::new(Normalizer::from_values(column.values)?);

        let mut canvas = RgbaImage::from_pixel(layout.canvas_width, layout.canvas_height, WHITE);
        imageops::overlay(
            &mut canvas,
            background,
            layout.plot_x as i64,
            layout.plot_y as i64,
        );
        self.draw_overlay(&mut canvas, &layout, field, &field_mapper);
        if let Some(bar) = layout.colorbar {
            self.draw_colorbar(&mut canvas, bar, &field_mapper);
        }
        self.draw_markers(&mut canvas, &layout, column, &point_mapper);
        self.draw_title(&mut canvas, &layout, title);

        Ok(canvas)
    }

    fn check_extent(&self, background: &RgbaImage, field: &GridField) -> HeatmapResult<()> {
        let (width, height) = (background.width() as f64, background.height() as f64);
        let last_x = field.xs().last().copied().unwrap_or(f64::NAN);
        let last_y = field.ys().last().copied().unwrap_or(f64::NAN);
        let spans_image = (field.xs().len() < 2 || last_x == width)
            && (field.ys().len() < 2 || last_y == height);
        if spans_image {
            Ok(())
        } else {
            Err(HeatmapError::Render(format!(
                "field spans {}x{} but background is {}x{}",
                last_x, last_y, width, height
            )))
        }
    }

    fn draw_overlay(
        &self,
        canvas: &mut RgbaImage,
        layout: &PlotLayout,
        field: &GridField,
        mapper: &ColorMapper,
    ) {
        let alpha = (self.config.overlay_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        for py in 0..layout.plot_height {
            let y = py as f64 + 0.5;
            for px in 0..layout.plot_width {
                let value = field.sample(px as f64 + 0.5, y);
                canvas
                    .get_pixel_mut(layout.plot_x + px, layout.plot_y + py)
                    .blend(&mapper.rgba(value, alpha));
            }
        }
    }

    fn draw_colorbar(
        &self,
        canvas: &mut RgbaImage,
        (x, y, width, height): (u32, u32, u32, u32),
        mapper: &ColorMapper,
    ) {
        let norm = mapper.normalizer();
        for row in 0..height {
            let t = if norm.is_degenerate() || height < 2 {
                0.5
            } else {
                1.0 - row as f64 / (height - 1) as f64
            };
            let c = mapper.color_at(t);
            draw_filled_rect_mut(
                canvas,
                Rect::at(x as i32, (y + row) as i32).of_size(width, 1),
                Rgba([c.red, c.green, c.blue, 255]),
            );
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(x as i32, y as i32).of_size(width, height),
            BLACK,
        );

        if let Some(font) = self.font {
            let scale = PxScale::from((width as f32 * 0.9).max(8.0));
            let label_x = (x + width + 3) as i32;
            let top = format_value(norm.max());
            let bottom = format_value(norm.min());
            let (_, text_h) = text_size(scale, font, &bottom);
            draw_text_mut(canvas, BLACK, label_x, y as i32, scale, font, &top);
            draw_text_mut(
                canvas,
                BLACK,
                label_x,
                (y + height) as i32 - text_h as i32,
                scale,
                font,
                &bottom,
            );
        }
    }

    fn draw_markers(
        &self,
        canvas: &mut RgbaImage,
        layout: &PlotLayout,
        column: &MetricColumn<'_>,
        mapper: &ColorMapper,
    ) {
        let radius = self.config.marker_radius.max(1);
        for (position, &value) in column
            .real_coordinates()
            .iter()
            .zip(column.real_values())
        {
            let center = (
                (layout.plot_x as f64 + position.x).round() as i32,
                (layout.plot_y as f64 + position.y).round() as i32,
            );
            draw_filled_circle_mut(canvas, center, radius, mapper.rgba(value, 255));
            for ring in 0..self.config.marker_outline.max(0) {
                draw_hollow_circle_mut(canvas, center, radius + ring, BLACK);
            }
        }
    }

    fn draw_title(&self, canvas: &mut RgbaImage, layout: &PlotLayout, title: &str) {
        if layout.plot_y == 0 {
            return;
        }
        let Some(font) = self.font else {
            log::debug!("no font loaded; skipping title {:?}", title);
            return;
        };

        let (scale, text_w, text_h) =
            fit_text(font, title, layout.plot_y as f32 * 0.6, layout.canvas_width);
        let x = (layout.canvas_width as i32 - text_w as i32) / 2;
        let y = (layout.plot_y as i32 - text_h as i32) / 2;
        draw_text_mut(canvas, BLACK, x.max(0), y.max(0), scale, font, title);
    }
}

/// Largest scale up to `start` at which `text` fits in `max_width` pixels.
fn fit_text(font: &FontArc, text: &str, start: f32, max_width: u32) -> (PxScale, u32, u32) {
    let mut scale = PxScale::from(start.max(1.0));
    let (mut text_w, mut text_h) = text_size(scale, font, text);
    while text_w > max_width && scale.y > 1.0 {
        let shrunk = scale.y * max_width as f32 / text_w as f32;
        scale = PxScale::from(shrunk.floor().min(scale.y - 1.0).max(1.0));
        (text_w, text_h) = text_size(scale, font, text);
    }
    (scale, text_w, text_h)
}

fn format_value(value: f64) -> String {
    if value.abs() >= 100.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::aggregate::DataAggregator;
    use crate::processing::grid::{GridSampler, GridSpec};
    use crate::processing::interpolate::RbfInterpolator;
    use crate::survey::{Dataset, MeasurementPoint, Metric};

    fn floor_plan(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 200, 200, 255]))
    }

    fn rssi_dataset(values: &[(f64, f64, f64)], width: u32, height: u32) -> Dataset {
        let points = values
            .iter()
            .map(|&(x, y, v)| MeasurementPoint::new(x, y).with_value(Metric::Rssi, v))
            .collect();
        Dataset::new(points, width, height).unwrap()
    }

    fn render_rssi(dataset: &Dataset, config: &StageConfig) -> (RgbaImage, PlotLayout) {
        let table = DataAggregator::aggregate(dataset).unwrap();
        let column = table.column(Metric::Rssi).unwrap();
        let model = RbfInterpolator::fit_column(&column).unwrap();
        let spec = GridSpec::for_image(dataset.width(), dataset.height(), config.grid_divisor)
            .unwrap();
        let field = GridSampler::new(spec).sample(&model).unwrap();
        let background = floor_plan(dataset.width(), dataset.height());
        let renderer = Renderer::new(config, None);
        let layout = renderer.layout(&background);
        let image = renderer.render(&background, &field, &column, "test").unwrap();
        (image, layout)
    }

    #[test]
    fn layout_keeps_plot_area_at_image_size() {
        let config = StageConfig::default();
        let layout = PlotLayout::for_image(100, 60, &config);
        assert_eq!((layout.plot_width, layout.plot_height), (100, 60));
        assert_eq!(layout.canvas_width, 100 + config.colorbar_band);
        assert_eq!(layout.canvas_height, 60 + config.title_band);
        assert_eq!(layout.plot_y, config.title_band);
        let (bar_x, _, _, bar_h) = layout.colorbar.unwrap();
        assert!(bar_x >= 100);
        assert_eq!(bar_h, 48);
    }

    #[test]
    fn overlay_blends_field_colour_over_background() {
        let config = StageConfig {
            marker_radius: 1,
            marker_outline: 0,
            ..StageConfig::default()
        };
        let dataset = rssi_dataset(
            &[(20.0, 20.0, -50.0), (80.0, 20.0, -50.0), (50.0, 80.0, -50.0)],
            100,
            100,
        );
        let (image, layout) = render_rssi(&dataset, &config);
        assert_eq!(image.dimensions(), (layout.canvas_width, layout.canvas_height));

        // Uniform field sits at the palette midpoint, blended 50/50 with grey.
        let pixel = image.get_pixel(layout.plot_x + 5, layout.plot_y + 60);
        let expected = {
            let mut base = Rgba([200, 200, 200, 255]);
            base.blend(&Rgba([255, 255, 191, 128]));
            base
        };
        assert_eq!(*pixel, expected);
    }

    #[test]
    fn markers_use_measured_value_colour_with_outline() {
        let config = StageConfig {
            marker_radius: 4,
            marker_outline: 1,
            ..StageConfig::default()
        };
        let dataset = rssi_dataset(
            &[(30.0, 30.0, -40.0), (70.0, 60.0, -80.0), (50.0, 20.0, -60.0)],
            100,
            100,
        );
        let (image, layout) = render_rssi(&dataset, &config);

        let hot = image.get_pixel(layout.plot_x + 30, layout.plot_y + 30);
        assert_eq!(*hot, Rgba([165, 0, 38, 255]));
        let cold = image.get_pixel(layout.plot_x + 70, layout.plot_y + 60);
        assert_eq!(*cold, Rgba([49, 54, 149, 255]));
        let rim = image.get_pixel(layout.plot_x + 30 + 4, layout.plot_y + 30);
        assert_eq!(*rim, BLACK);
    }

    #[test]
    fn degenerate_colorbar_is_a_single_colour() {
        let config = StageConfig::default();
        let dataset = rssi_dataset(
            &[(20.0, 20.0, -50.0), (80.0, 20.0, -50.0), (50.0, 80.0, -50.0)],
            100,
            100,
        );
        let (image, layout) = render_rssi(&dataset, &config);
        let (x, y, w, h) = layout.colorbar.unwrap();
        let inner_x = x + w / 2;
        let top = image.get_pixel(inner_x, y + 1);
        let bottom = image.get_pixel(inner_x, y + h - 2);
        assert_eq!(top, bottom);
        assert_eq!(*top, Rgba([255, 255, 191, 255]));
    }

    #[test]
    fn mismatched_background_is_a_render_error() {
        let config = StageConfig::default();
        let dataset = rssi_dataset(&[(10.0, 10.0, -50.0), (30.0, 5.0, -60.0)], 40, 20);
        let table = DataAggregator::aggregate(&dataset).unwrap();
        let column = table.column(Metric::Rssi).unwrap();
        let model = RbfInterpolator::fit_column(&column).unwrap();
        let field = GridSampler::new(GridSpec::for_image(40, 20, 4).unwrap())
            .sample(&model)
            .unwrap();

        let err = Renderer::new(&config, None)
            .render(&floor_plan(80, 40), &field, &column, "mismatch")
            .unwrap_err();
        assert!(matches!(err, HeatmapError::Render(_)));
    }

    fn system_font() -> Option<FontArc> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
        ]
        .iter()
        .filter_map(|path| std::fs::read(path).ok())
        .find_map(|bytes| FontArc::try_from_vec(bytes).ok())
    }

    fn dark_pixels(image: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y)[0] < 128)
            .count()
    }

    #[test]
    fn title_and_colorbar_labels_are_drawn_with_a_font() {
        let Some(font) = system_font() else {
            return;
        };
        let config = StageConfig::default();
        let dataset = rssi_dataset(
            &[(30.0, 50.0, -40.0), (70.0, 60.0, -80.0), (50.0, 80.0, -60.0)],
            100,
            100,
        );
        let table = DataAggregator::aggregate(&dataset).unwrap();
        let column = table.column(Metric::Rssi).unwrap();
        let model = RbfInterpolator::fit_column(&column).unwrap();
        let field = GridSampler::new(GridSpec::for_image(100, 100, 4).unwrap())
            .sample(&model)
            .unwrap();
        let background = floor_plan(100, 100);
        let renderer = Renderer::new(&config, Some(&font));
        let layout = renderer.layout(&background);
        let image = renderer
            .render(&background, &field, &column, "a fairly long survey title - RSSI (level)")
            .unwrap();

        assert!(dark_pixels(&image, 0..layout.canvas_width, 0..layout.plot_y) > 0);
        let (bar_x, bar_y, bar_w, bar_h) = layout.colorbar.unwrap();
        let labels = dark_pixels(
            &image,
            bar_x + bar_w + 1..layout.canvas_width,
            bar_y..bar_y + bar_h,
        );
        assert!(labels > 0);
    }

    #[test]
    fn long_titles_shrink_to_fit_the_canvas() {
        let Some(font) = system_font() else {
            return;
        };
        let title = "a fairly long survey title - RSSI (level)";
        let (_, unfitted, _) = fit_text(&font, title, 19.2, u32::MAX);
        assert!(unfitted > 172);

        let (scale, text_w, _) = fit_text(&font, title, 19.2, 172);
        assert!(text_w <= 172);
        assert!(scale.y < 19.2);

        let (short_scale, _, _) = fit_text(&font, "lab", 19.2, 172);
        assert_eq!(short_scale.y, 19.2);
    }

    #[test]
    fn value_labels_drop_needless_decimals() {
        assert_eq!(format_value(-50.0), "-50");
        assert_eq!(format_value(0.1234), "0.12");
        assert_eq!(format_value(250.4), "250");
    }
}
