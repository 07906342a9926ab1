//! Decorative starfield with periodic meteor streaks.
//!
//! Stateless with respect to the rest of the application: it reads nothing
//! and nobody reads it. Disabled entirely in plain mode.

use crate::ui::screen::Screen;
use crossterm::style::Color;
use rand::Rng;
use std::time::Duration;

const STAR_COUNT: usize = 200;
const METEOR_SPAWN_INTERVAL: Duration = Duration::from_secs(2);
const METEOR_LIFETIME: Duration = Duration::from_secs(1);

struct Star {
    x: u16,
    y: u16,
    /// Twinkle phase offset so stars do not blink in lockstep.
    phase: f32,
    /// Cycle length in seconds.
    period: f32,
    tinted: bool,
}

struct Meteor {
    x: f32,
    y: f32,
    age: Duration,
}

pub struct Starfield {
    width: u16,
    height: u16,
    stars: Vec<Star>,
    meteors: Vec<Meteor>,
    clock: f32,
    since_spawn: Duration,
}

impl Starfield {
    pub fn new(width: u16, height: u16) -> Self {
        let mut rng = rand::thread_rng();
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.gen_range(0..width.max(1)),
                y: rng.gen_range(0..height.max(1)),
                phase: rng.r#gen::<f32>() * std::f32::consts::TAU,
                period: 3.0 + rng.r#gen::<f32>() * 4.0,
                tinted: rng.r#gen::<f32>() > 0.9,
            })
            .collect();

        Self {
            width,
            height,
            stars,
            meteors: Vec::new(),
            clock: 0.0,
            since_spawn: Duration::ZERO,
        }
    }

    /// Advance the animation: twinkle, spawn a meteor on the fixed timer,
    /// retire meteors whose flight has completed.
    pub fn tick(&mut self, dt: Duration) {
        self.clock += dt.as_secs_f32();
        self.since_spawn += dt;

        for meteor in &mut self.meteors {
            meteor.age += dt;
            let speed = self.height as f32 / METEOR_LIFETIME.as_secs_f32();
            meteor.x += speed * dt.as_secs_f32() * 0.6;
            meteor.y += speed * dt.as_secs_f32();
        }
        self.meteors.retain(|m| m.age < METEOR_LIFETIME);

        if self.since_spawn >= METEOR_SPAWN_INTERVAL {
            self.since_spawn = Duration::ZERO;
            let mut rng = rand::thread_rng();
            self.meteors.push(Meteor {
                x: rng.gen_range(0.0..self.width.max(1) as f32),
                y: 0.0,
                age: Duration::ZERO,
            });
        }
    }

    pub fn draw(&self, screen: &mut Screen, top: u16, bottom: u16) {
        for star in &self.stars {
            if star.y < top || star.y >= bottom {
                continue;
            }
            let brightness = ((self.clock * std::f32::consts::TAU / star.period) + star.phase)
                .sin()
                * 0.5
                + 0.5;
            let (ch, color) = if brightness > 0.66 {
                ('✦', if star.tinted { Color::Cyan } else { Color::White })
            } else if brightness > 0.33 {
                ('·', Color::Grey)
            } else {
                ('·', Color::DarkGrey)
            };
            screen.set(star.x as i32, star.y as i32, ch, Some(color), false);
        }

        for meteor in &self.meteors {
            let y = meteor.y as i32;
            if y >= top as i32 && y < bottom as i32 {
                screen.set(meteor.x as i32, y, '╲', Some(Color::Yellow), true);
            }
        }
    }

    #[cfg(test)]
    fn meteor_count(&self) -> usize {
        self.meteors.len()
    }
}
