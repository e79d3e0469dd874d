use egui::{Slider, Ui};
use std::time::Instant;

use crate::time::{SLIDER_MAX, VOLUME_MAX};
use crate::transport::{MediaEngine, PlayPause, Transport};

pub struct PlayerControls;

impl PlayerControls {
    /// Control row and seek bar. Returns true when the user asked for a
    /// file to be opened.
    pub fn show<E: MediaEngine>(
        ui: &mut Ui,
        transport: &mut Transport,
        engine: &mut E,
        now: Instant,
    ) -> bool {
        let mut wants_file = false;

        ui.horizontal(|ui| {
            if ui.button("Open Video").clicked() {
                wants_file = true;
            }

            if ui
                .button(transport.play_button().icon())
                .on_hover_text("Play / Pause (Space)")
                .clicked()
                && transport.play_pause(engine, now) == PlayPause::NeedsMedia
            {
                wants_file = true;
            }

            if ui.button("⏹").on_hover_text("Stop").clicked() {
                transport.stop(engine);
            }

            ui.separator();

            ui.label("🔊");
            let mut volume = transport.volume();
            if ui
                .add(Slider::new(&mut volume, 0..=VOLUME_MAX).show_value(false))
                .changed()
            {
                transport.set_volume(engine, volume);
            }

            ui.separator();

            ui.monospace(transport.time_label());
        });

        ui.add_space(2.0);
        Self::seek_bar(ui, transport, engine);

        wants_file
    }

    fn seek_bar<E: MediaEngine>(ui: &mut Ui, transport: &mut Transport, engine: &mut E) {
        ui.scope(|ui| {
            ui.style_mut().spacing.slider_width = ui.available_width();

            let mut position = transport.seek_slider();
            let response = ui.add(
                Slider::new(&mut position, 0..=SLIDER_MAX)
                    .show_value(false)
                    .trailing_fill(true),
            );

            if response.drag_started() {
                transport.set_seek_dragging(true);
            }
            if response.changed() {
                transport.seek(engine, position);
            }
            if response.drag_stopped() {
                transport.set_seek_dragging(false);
            }
        });
    }
}
