//! Integration flows across content client, gateway and telemetry.

pub mod fixtures;

#[cfg(test)]
mod endpoints;
#[cfg(test)]
mod pages;
#[cfg(test)]
mod revalidation;
