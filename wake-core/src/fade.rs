//! Fade Engine - Zeitgesteuerte Farbübergänge auf drei PWM-Kanälen
//!
//! Es läuft höchstens ein Fade gleichzeitig. Eine Anfrage während eines
//! laufenden Fades wird als "pending" gemerkt (die letzte gewinnt) und
//! erst gestartet, wenn der aktive Fade fertig ist.

use rgb::RGB8;

use crate::traits::PwmChannel;
use crate::types::{LIGHT_COLOR_OFF, LIGHT_COLOR_ON};

/// Zustand eines einzelnen Kanals während eines Fades
#[derive(Debug, Clone, Copy, Default)]
struct ChannelFade {
    start: u8,
    current: u8,
    target: u8,
    rate_per_ms: f32,
}

impl ChannelFade {
    fn settled(duty: u8) -> Self {
        Self {
            start: duty,
            current: duty,
            target: duty,
            rate_per_ms: 0.0,
        }
    }

    fn delta(&self) -> u32 {
        self.target.abs_diff(self.current) as u32
    }

    fn at(&self, elapsed_ms: u64) -> u8 {
        let value = self.start as f32 + self.rate_per_ms * elapsed_ms as f32;
        libm::roundf(value).clamp(0.0, 255.0) as u8
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveFade {
    started_ms: u64,
    deadline_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingFade {
    color: RGB8,
    ms_per_step: u32,
}

pub struct FadeEngine<P: PwmChannel> {
    channels: [P; 3],
    fades: [ChannelFade; 3],
    target: RGB8,
    active: Option<ActiveFade>,
    pending: Option<PendingFade>,
}

impl<P: PwmChannel> FadeEngine<P> {
    /// Übernimmt die drei Kanäle (R, G, B) und setzt sie sofort auf `initial`
    pub fn new(channels: [P; 3], initial: RGB8) -> Self {
        let mut engine = Self {
            channels,
            fades: [ChannelFade::default(); 3],
            target: initial,
            active: None,
            pending: None,
        };
        engine.apply_now(initial);
        engine
    }

    /// Startet einen Fade nach `color`
    ///
    /// Die Dauer ist `ms_per_step` × größte Kanal-Differenz. `ms_per_step == 0`
    /// setzt die Farbe sofort. Läuft bereits ein Fade, wird die Anfrage als
    /// pending gespeichert und ersetzt eine eventuell schon wartende.
    pub fn set_color(&mut self, color: RGB8, ms_per_step: u32, now_ms: u64) {
        self.target = color;

        if self.active.is_some() {
            if self.pending.is_some() {
                debug!("Fade: replacing pending request");
            }
            info!("Fade: deferring set_color");
            self.pending = Some(PendingFade { color, ms_per_step });
            return;
        }

        self.start(color, ms_per_step, now_ms);
    }

    /// Schaltet zwischen aus und [`LIGHT_COLOR_ON`] um
    pub fn toggle(&mut self, ms_per_step: u32, now_ms: u64) {
        let next = if self.target == LIGHT_COLOR_OFF {
            LIGHT_COLOR_ON
        } else {
            LIGHT_COLOR_OFF
        };
        self.set_color(next, ms_per_step, now_ms);
    }

    /// Periodischer Aufruf (z.B. alle 10 ms) aus der Hauptschleife
    pub fn tick(&mut self, now_ms: u64) {
        let Some(active) = self.active else {
            return;
        };

        if now_ms >= active.deadline_ms {
            // Exakt auf das Ziel setzen, keine Rundungsreste
            for index in 0..3 {
                let target = self.fades[index].target;
                self.fades[index] = ChannelFade::settled(target);
                self.write(index);
            }
            self.active = None;

            if let Some(pending) = self.pending.take() {
                info!("Fade: applying pending fade");
                self.start(pending.color, pending.ms_per_step, now_ms);
            }
            return;
        }

        let elapsed = now_ms.saturating_sub(active.started_ms);
        for index in 0..3 {
            let duty = self.fades[index].at(elapsed);
            if duty != self.fades[index].current {
                self.fades[index].current = duty;
                self.write(index);
            }
        }
    }

    /// Zielfarbe der letzten Anfrage (nicht der aktuelle Zwischenwert)
    pub fn color(&self) -> RGB8 {
        self.target
    }

    /// Aktuell ausgegebene Duty-Werte
    pub fn current_duty(&self) -> RGB8 {
        RGB8 {
            r: self.fades[0].current,
            g: self.fades[1].current,
            b: self.fades[2].current,
        }
    }

    /// `true` solange ein Fade läuft oder wartet
    pub fn is_fading(&self) -> bool {
        self.active.is_some() || self.pending.is_some()
    }

    fn start(&mut self, color: RGB8, ms_per_step: u32, now_ms: u64) {
        if ms_per_step == 0 {
            self.apply_now(color);
            return;
        }

        let targets = [color.r, color.g, color.b];
        for (fade, target) in self.fades.iter_mut().zip(targets) {
            fade.start = fade.current;
            fade.target = target;
        }

        let max_delta = self.fades.iter().map(ChannelFade::delta).max().unwrap_or(0);
        if max_delta == 0 {
            return;
        }

        let duration_ms = ms_per_step as u64 * max_delta as u64;
        for fade in &mut self.fades {
            fade.rate_per_ms = (fade.target as f32 - fade.start as f32) / duration_ms as f32;
        }

        info!(
            "Fade: R{}|G{}|B{} over {} ms",
            color.r, color.g, color.b, duration_ms
        );
        self.active = Some(ActiveFade {
            started_ms: now_ms,
            deadline_ms: now_ms + duration_ms,
        });
    }

    fn apply_now(&mut self, color: RGB8) {
        let targets = [color.r, color.g, color.b];
        for (index, target) in targets.into_iter().enumerate() {
            self.fades[index] = ChannelFade::settled(target);
            self.write(index);
        }
    }

    fn write(&mut self, index: usize) {
        let duty = self.fades[index].current;
        if let Err(e) = self.channels[index].set_duty(duty) {
            warn!("Fade: PWM write failed on channel {}: {}", index, e);
        }
    }
}
