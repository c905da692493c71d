//! Device-aware image selection.
//!
//! [`resolve_image`] is the only resolution path. Slot helpers choose which
//! form a slot prefers and delegate.

use crate::entities::DeviceImage;
use crate::kind::Device;

/// Returned when no candidate URL is usable.
pub const PLACEHOLDER: &str = "/images/placeholders/placeholder.png";

/// Resolve an image for `preferred`: preferred form, then the other form,
/// then the thumbnail, then [`PLACEHOLDER`]. Empty strings count as absent.
pub fn resolve_image(image: Option<&DeviceImage>, preferred: Device) -> String {
    let Some(image) = image else {
        return PLACEHOLDER.to_string();
    };
    [
        form(image, preferred),
        form(image, preferred.other()),
        image.thumbnail.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|url| !url.is_empty())
    .unwrap_or(PLACEHOLDER)
    .to_string()
}

fn form(image: &DeviceImage, device: Device) -> Option<&str> {
    match device {
        Device::Desktop => image.desktop.as_deref(),
        Device::Mobile => image.mobile.as_deref(),
    }
}

pub fn pick_hero(image: Option<&DeviceImage>, device: Device) -> String {
    resolve_image(image, device)
}

pub fn pick_banner(image: Option<&DeviceImage>, device: Device) -> String {
    resolve_image(image, device)
}

/// Logos are authored for desktop first regardless of the caller's device.
pub fn pick_logo(image: Option<&DeviceImage>) -> String {
    resolve_image(image, Device::Desktop)
}

pub fn pick_hover(image: Option<&DeviceImage>) -> String {
    resolve_image(image, Device::Desktop)
}
