//! Studio light rig: one ambient term plus a handful of directional lights.

use cgmath::{InnerSpace, Vector3};
use serde::{Deserialize, Serialize};

/// Directional lights the lit shader can consume
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Splits 0xRRGGBB into normalized channels, still sRGB encoded
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// sRGB transfer function inverse for one channel in 0..=1
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Config colours are sRGB; shading and the sRGB surface expect linear values
pub fn linear_rgb_from_hex(hex: u32) -> [f32; 3] {
    rgb_from_hex(hex).map(srgb_to_linear)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub color: u32,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 0.25,
        }
    }
}

/// A light infinitely far away, shining from `position` toward the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    #[serde(default)]
    pub name: String,
    pub color: u32,
    pub intensity: f32,
    pub position: [f32; 3],
}

impl DirectionalLight {
    pub fn new(name: &str, color: u32, intensity: f32, position: [f32; 3]) -> Self {
        Self {
            name: name.to_owned(),
            color,
            intensity,
            position,
        }
    }

    /// Unit vector from the lit surface toward the light
    pub fn direction(&self) -> Vector3<f32> {
        let to_light = Vector3::from(self.position);
        if to_light.magnitude2() > 0.0 {
            to_light.normalize()
        } else {
            Vector3::unit_y()
        }
    }

    fn to_raw(&self) -> DirectionalLightRaw {
        let d = self.direction();
        DirectionalLightRaw {
            direction: [d.x, d.y, d.z, 0.0],
            color: scaled_color(self.color, self.intensity),
        }
    }
}

fn scaled_color(hex: u32, intensity: f32) -> [f32; 4] {
    let [r, g, b] = linear_rgb_from_hex(hex);
    [r * intensity, g * intensity, b * intensity, 1.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub ambient: AmbientLight,
    pub directional: Vec<DirectionalLight>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: AmbientLight::default(),
            directional: vec![
                DirectionalLight::new("key", 0xffffff, 0.5, [8.0, 10.0, 6.0]),
                DirectionalLight::new("fill", 0x88ccff, 0.2, [-12.0, 5.0, 5.0]),
                DirectionalLight::new("rim", 0xffffff, 1.4, [0.0, 8.0, 12.0]),
            ],
        }
    }
}

impl Lighting {
    /// Packs the rig for the global uniform, dropping lights past the shader limit
    pub fn to_raw(&self) -> LightingRaw {
        if self.directional.len() > MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "{} directional lights configured, only the first {} are used",
                self.directional.len(),
                MAX_DIRECTIONAL_LIGHTS
            );
        }

        let mut raw = LightingRaw {
            ambient: scaled_color(self.ambient.color, self.ambient.intensity),
            ..LightingRaw::default()
        };

        for (slot, light) in raw
            .directional
            .iter_mut()
            .zip(self.directional.iter().take(MAX_DIRECTIONAL_LIGHTS))
        {
            *slot = light.to_raw();
            raw.count += 1;
        }

        raw
    }
}

/// Matches `DirectionalLight` in the shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

/// Matches `Lighting` in the shaders (160 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingRaw {
    pub ambient: [f32; 4],
    pub directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub count: u32,
    pub _padding: [u32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(rgb_from_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(rgb_from_hex(0x000000), [0.0, 0.0, 0.0]);
        let [r, g, b] = rgb_from_hex(0x88ccff);
        assert_eq!(r, 136.0 / 255.0);
        assert_eq!(g, 204.0 / 255.0);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn test_hex_to_linear() {
        assert_eq!(linear_rgb_from_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(linear_rgb_from_hex(0x000000), [0.0, 0.0, 0.0]);

        let [r, g, b] = linear_rgb_from_hex(0x1a1a1a);
        assert_relative_eq!(r, 0.01033, epsilon = 1e-4);
        assert_eq!(g, r);
        assert_eq!(b, r);

        // Linear segment near black
        assert_relative_eq!(srgb_to_linear(0.04), 0.04 / 12.92, epsilon = 1e-7);
        assert_relative_eq!(srgb_to_linear(0.5), 0.21404, epsilon = 1e-4);
    }

    #[test]
    fn test_light_colors_are_linear() {
        let light = DirectionalLight::new("fill", 0x88ccff, 1.0, [0.0, 1.0, 0.0]);
        let raw = light.to_raw();
        assert_relative_eq!(raw.color[0], srgb_to_linear(136.0 / 255.0), epsilon = 1e-6);
        assert!(raw.color[0] < 136.0 / 255.0);
        assert_eq!(raw.color[2], 1.0);
    }

    #[test]
    fn test_default_rig() {
        let lighting = Lighting::default();
        assert_eq!(lighting.ambient.intensity, 0.25);
        assert_eq!(lighting.directional.len(), 3);
        assert_eq!(lighting.directional[1].color, 0x88ccff);
        assert_eq!(lighting.directional[2].intensity, 1.4);
    }

    #[test]
    fn test_direction_points_at_light() {
        let light = DirectionalLight::new("key", 0xffffff, 1.0, [0.0, 8.0, 6.0]);
        let d = light.direction();
        assert_relative_eq!(d.y, 0.8, epsilon = 1e-6);
        assert_relative_eq!(d.z, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_raw_packing() {
        let raw = Lighting::default().to_raw();
        assert_eq!(raw.count, 3);
        assert_eq!(raw.ambient, [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(raw.directional[0].color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(raw.directional[3], DirectionalLightRaw::default());
        assert_eq!(std::mem::size_of::<LightingRaw>(), 160);
    }

    #[test]
    fn test_extra_lights_are_truncated() {
        let lighting = Lighting {
            directional: (0..6)
                .map(|i| DirectionalLight::new("extra", 0xffffff, 1.0, [i as f32, 1.0, 0.0]))
                .collect(),
            ..Default::default()
        };
        assert_eq!(lighting.to_raw().count, MAX_DIRECTIONAL_LIGHTS as u32);
    }
}
