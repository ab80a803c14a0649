//! Configuration

// Imports
use {
	crate::{
		sim_log::{PageAddr, PlaneAddr},
		ErrorKind,
	},
	anyhow::Context,
	nvsched_util::SimDuration,
	std::{fs, io, path::Path},
};

/// Configuration
#[derive(PartialEq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Array geometry
	pub geometry: Geometry,

	/// Timing
	pub timing: Timing,
}

impl Config {
	/// Loads a configuration from a json file.
	///
	/// Any missing fields are filled with their defaults.
	pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
		let file = fs::File::open(path)
			.context(ErrorKind::FileAccess)
			.with_context(|| format!("Unable to open config file {path:?}"))?;
		Self::from_reader(io::BufReader::new(file)).with_context(|| format!("Unable to load config file {path:?}"))
	}

	/// Parses and validates a configuration from a json reader
	pub fn from_reader(reader: impl io::Read) -> Result<Self, anyhow::Error> {
		let config = serde_json::from_reader::<_, Self>(reader)
			.context(ErrorKind::Argument)
			.context("Unable to parse config")?;
		config.validate()?;

		Ok(config)
	}

	/// Validates this configuration
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		let geometry = &self.geometry;
		let counts = [
			("packages", geometry.packages),
			("dies_per_package", geometry.dies_per_package),
			("planes_per_die", geometry.planes_per_die),
			("blocks_per_plane", geometry.blocks_per_plane),
			("pages_per_block", geometry.pages_per_block),
			("page_size_bits", geometry.page_size_bits),
			("device_width_bits", self.timing.device_width_bits),
			("channel_width_bits", self.timing.channel_width_bits),
		];
		for (name, count) in counts {
			if count == 0 {
				return Err(anyhow::Error::new(ErrorKind::Argument).context(format!("Config field `{name}` must be non-zero")));
			}
		}

		let cycles = [
			("device_cycle_ns", self.timing.device_cycle_ns),
			("channel_cycle_ns", self.timing.channel_cycle_ns),
		];
		for (name, cycle) in cycles {
			if !(cycle.is_finite() && cycle > 0.0) {
				return Err(anyhow::Error::new(ErrorKind::Argument)
					.context(format!("Config field `{name}` must be positive, found {cycle}")));
			}
		}

		Ok(())
	}
}

/// Array geometry
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Geometry {
	pub packages:         usize,
	pub dies_per_package: usize,
	pub planes_per_die:   usize,
	pub blocks_per_plane: usize,
	pub pages_per_block:  usize,
	pub page_size_bits:   usize,
}

impl Geometry {
	/// Returns the total number of planes
	pub fn total_planes(&self) -> usize {
		self.packages * self.dies_per_package * self.planes_per_die
	}

	/// Returns the flat index of a plane.
	///
	/// Planes are numbered package-major, then die, then plane.
	pub fn plane_idx(&self, plane: PlaneAddr) -> Result<usize, anyhow::Error> {
		self.check_plane(plane)?;
		Ok((plane.package * self.dies_per_package + plane.die) * self.planes_per_die + plane.plane)
	}

	/// Returns the plane address of a flat plane index
	pub fn plane_addr(&self, plane_idx: usize) -> PlaneAddr {
		PlaneAddr {
			package: plane_idx / self.planes_per_die / self.dies_per_package,
			die:     plane_idx / self.planes_per_die % self.dies_per_package,
			plane:   plane_idx % self.planes_per_die,
		}
	}

	/// Returns an iterator over all planes, in flat index order
	pub fn planes(&self) -> impl Iterator<Item = PlaneAddr> + '_ {
		(0..self.total_planes()).map(|plane_idx| self.plane_addr(plane_idx))
	}

	/// Checks that a plane address lies within this geometry
	pub fn check_plane(&self, plane: PlaneAddr) -> Result<(), anyhow::Error> {
		let bounds = [
			("package", plane.package, self.packages),
			("die", plane.die, self.dies_per_package),
			("plane", plane.plane, self.planes_per_die),
		];
		self::check_bounds(&bounds).with_context(|| format!("Plane {plane} is outside of the array"))
	}

	/// Checks that a page address lies within this geometry
	pub fn check_page(&self, page: PageAddr) -> Result<(), anyhow::Error> {
		self.check_plane(page.plane)?;

		let bounds = [
			("block", page.block, self.blocks_per_plane),
			("page", page.page, self.pages_per_block),
		];
		self::check_bounds(&bounds).with_context(|| format!("Page {page} is outside of the array"))
	}
}

impl Default for Geometry {
	fn default() -> Self {
		Self {
			packages:         32,
			dies_per_package: 4,
			planes_per_die:   1,
			blocks_per_plane: 32,
			pages_per_block:  48,
			page_size_bits:   32768,
		}
	}
}

/// Checks that each `(name, idx, count)` satisfies `idx < count`
fn check_bounds(bounds: &[(&str, usize, usize)]) -> Result<(), anyhow::Error> {
	for &(name, idx, count) in bounds {
		if idx >= count {
			return Err(anyhow::Error::new(ErrorKind::Parse).context(format!("{name} index {idx} must be less than {count}")));
		}
	}

	Ok(())
}

/// Timing
#[derive(PartialEq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Timing {
	/// Device cycle, in nanoseconds.
	///
	/// Log timestamps are counted in device cycles.
	pub device_cycle_ns: f64,

	/// Channel cycle, in nanoseconds
	pub channel_cycle_ns: f64,

	/// Device bus width, in bits
	pub device_width_bits: usize,

	/// Channel bus width, in bits
	pub channel_width_bits: usize,
}

impl Timing {
	/// Returns the simulated duration of `cycles` device cycles
	pub fn cycles_duration(&self, cycles: f64) -> SimDuration {
		SimDuration::from_nanos_f64(cycles * self.device_cycle_ns)
	}

	/// Returns the time to move one page over the channel
	pub fn channel_page_transfer(&self, geometry: &Geometry) -> SimDuration {
		let transfers = geometry.page_size_bits as f64 / self.channel_width_bits as f64;
		SimDuration::from_nanos_f64(transfers * self.channel_cycle_ns)
	}

	/// Returns the time to move one page over the device bus
	pub fn device_page_transfer(&self, geometry: &Geometry) -> SimDuration {
		let transfers = geometry.page_size_bits as f64 / self.device_width_bits as f64;
		SimDuration::from_nanos_f64(transfers * self.device_cycle_ns)
	}
}

impl Default for Timing {
	fn default() -> Self {
		Self {
			device_cycle_ns:    2.5,
			channel_cycle_ns:   0.15,
			device_width_bits:  8,
			channel_width_bits: 8,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plane_indices_round_trip_in_order() {
		let geometry = Geometry {
			packages: 2,
			dies_per_package: 3,
			planes_per_die: 2,
			..Geometry::default()
		};

		assert_eq!(geometry.total_planes(), 12);
		for (plane_idx, plane) in geometry.planes().enumerate() {
			assert_eq!(geometry.plane_idx(plane).unwrap(), plane_idx);
		}
		assert_eq!(geometry.plane_addr(7), PlaneAddr {
			package: 1,
			die:     0,
			plane:   1,
		});
	}

	#[test]
	fn out_of_range_addresses_are_parse_errors() {
		let geometry = Geometry::default();
		let plane = PlaneAddr {
			package: 32,
			die:     0,
			plane:   0,
		};

		let err = geometry.check_plane(plane).unwrap_err();
		assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind::Parse));

		let page = PageAddr {
			plane: PlaneAddr::default(),
			block: 0,
			page:  48,
		};
		assert!(geometry.check_page(page).is_err());
	}

	#[test]
	fn missing_fields_take_defaults() {
		let config = Config::from_reader(r#"{ "geometry": { "packages": 2 } }"#.as_bytes()).unwrap();
		assert_eq!(config.geometry.packages, 2);
		assert_eq!(config.geometry.dies_per_package, 4);
		assert_eq!(config.timing, Timing::default());
	}

	#[test]
	fn zero_counts_are_rejected() {
		let err = Config::from_reader(r#"{ "timing": { "channel_width_bits": 0 } }"#.as_bytes()).unwrap_err();
		assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind::Argument));
	}

	#[test]
	fn page_transfer_times() {
		let config = Config::default();
		let channel = config.timing.channel_page_transfer(&config.geometry);
		let device = config.timing.device_page_transfer(&config.geometry);
		assert!((channel.as_nanos_f64() - 614.4).abs() < 1e-6);
		assert!((device.as_nanos_f64() - 10_240.0).abs() < 1e-6);
	}
}
