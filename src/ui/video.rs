use egui::{pos2, Align2, Color32, FontId, Rect, Sense, TextureId, Ui, Vec2};

/// Black area that fills the remaining space and shows the current frame.
pub struct VideoSurface;

impl VideoSurface {
    pub fn show(ui: &mut Ui, frame: Option<(TextureId, (u32, u32))>, error: Option<&str>) {
        let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);

        if let Some((texture, (width, height))) = frame {
            let size = fit_size(Vec2::new(width as f32, height as f32), rect.size());
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture, Rect::from_center_size(rect.center(), size), uv, Color32::WHITE);
        } else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Open a video or drop a file here",
                FontId::proportional(16.0),
                Color32::GRAY,
            );
        }

        if let Some(message) = error {
            painter.text(
                rect.center_top() + Vec2::new(0.0, 24.0),
                Align2::CENTER_TOP,
                message,
                FontId::proportional(14.0),
                Color32::RED,
            );
        }
    }
}

/// Largest size with the video's aspect ratio that fits in `available`.
pub fn fit_size(video: Vec2, available: Vec2) -> Vec2 {
    if video.x <= 0.0 || video.y <= 0.0 || available.x <= 0.0 || available.y <= 0.0 {
        return Vec2::ZERO;
    }
    let aspect = video.x / video.y;
    if aspect > available.x / available.y {
        Vec2::new(available.x, available.x / aspect)
    } else {
        Vec2::new(available.y * aspect, available.y)
    }
}
