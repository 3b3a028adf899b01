//! Trajectory and impact data writers.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::state::Tracks;
use crate::trajectory::ImpactRecord;

/// Receives one row per integration step.
pub trait TrajectorySink {
    fn record(&mut self, tracks: &Tracks, current_mass: f64) -> SimResult<()>;

    fn finish(&mut self) -> SimResult<()> {
        Ok(())
    }
}

/// Discards every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn record(&mut self, _tracks: &Tracks, _current_mass: f64) -> SimResult<()> {
        Ok(())
    }
}

/// Keeps every row in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub rows: Vec<(Tracks, f64)>,
}

impl TrajectorySink for MemorySink {
    fn record(&mut self, tracks: &Tracks, current_mass: f64) -> SimResult<()> {
        self.rows.push((*tracks, current_mass));
        Ok(())
    }
}

/// One line of a trajectory file: the true track, the vehicle mass, then the
/// estimated track with an `est_` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub ax_grav: f64,
    pub ay_grav: f64,
    pub az_grav: f64,
    pub ax_drag: f64,
    pub ay_drag: f64,
    pub az_drag: f64,
    pub ax_lift: f64,
    pub ay_lift: f64,
    pub az_lift: f64,
    pub ax_thrust: f64,
    pub ay_thrust: f64,
    pub az_thrust: f64,
    pub ax_total: f64,
    pub ay_total: f64,
    pub az_total: f64,
    pub current_mass: f64,
    pub est_t: f64,
    pub est_x: f64,
    pub est_y: f64,
    pub est_z: f64,
    pub est_vx: f64,
    pub est_vy: f64,
    pub est_vz: f64,
    pub est_ax_grav: f64,
    pub est_ay_grav: f64,
    pub est_az_grav: f64,
    pub est_ax_drag: f64,
    pub est_ay_drag: f64,
    pub est_az_drag: f64,
    pub est_ax_lift: f64,
    pub est_ay_lift: f64,
    pub est_az_lift: f64,
    pub est_ax_thrust: f64,
    pub est_ay_thrust: f64,
    pub est_az_thrust: f64,
    pub est_ax_total: f64,
    pub est_ay_total: f64,
    pub est_az_total: f64,
}

impl TrajectoryRow {
    pub fn new(tracks: &Tracks, current_mass: f64) -> Self {
        let s = &tracks.truth;
        let e = &tracks.estimated;
        let (a, ea) = (&s.accel, &e.accel);
        Self {
            t: s.t,
            x: s.position.x,
            y: s.position.y,
            z: s.position.z,
            vx: s.velocity.x,
            vy: s.velocity.y,
            vz: s.velocity.z,
            ax_grav: a.gravity.x,
            ay_grav: a.gravity.y,
            az_grav: a.gravity.z,
            ax_drag: a.drag.x,
            ay_drag: a.drag.y,
            az_drag: a.drag.z,
            ax_lift: a.lift.x,
            ay_lift: a.lift.y,
            az_lift: a.lift.z,
            ax_thrust: a.thrust.x,
            ay_thrust: a.thrust.y,
            az_thrust: a.thrust.z,
            ax_total: a.total.x,
            ay_total: a.total.y,
            az_total: a.total.z,
            current_mass,
            est_t: e.t,
            est_x: e.position.x,
            est_y: e.position.y,
            est_z: e.position.z,
            est_vx: e.velocity.x,
            est_vy: e.velocity.y,
            est_vz: e.velocity.z,
            est_ax_grav: ea.gravity.x,
            est_ay_grav: ea.gravity.y,
            est_az_grav: ea.gravity.z,
            est_ax_drag: ea.drag.x,
            est_ay_drag: ea.drag.y,
            est_az_drag: ea.drag.z,
            est_ax_lift: ea.lift.x,
            est_ay_lift: ea.lift.y,
            est_az_lift: ea.lift.z,
            est_ax_thrust: ea.thrust.x,
            est_ay_thrust: ea.thrust.y,
            est_az_thrust: ea.thrust.z,
            est_ax_total: ea.total.x,
            est_ay_total: ea.total.y,
            est_az_total: ea.total.z,
        }
    }
}

/// Streams [`TrajectoryRow`]s to CSV. The header is written with the first row.
pub struct CsvTrajectoryWriter<W: Write> {
    out: csv::Writer<W>,
}

impl CsvTrajectoryWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            out: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> CsvTrajectoryWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: csv::Writer::from_writer(out),
        }
    }

    pub fn into_inner(self) -> SimResult<W> {
        self.out.into_inner().map_err(|e| SimError::Io(e.into_error()))
    }
}

impl<W: Write> TrajectorySink for CsvTrajectoryWriter<W> {
    fn record(&mut self, tracks: &Tracks, current_mass: f64) -> SimResult<()> {
        self.out.serialize(TrajectoryRow::new(tracks, current_mass))?;
        Ok(())
    }

    fn finish(&mut self) -> SimResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Directory holding the files of one named run.
pub fn run_directory(output_dir: &str, run_name: &str) -> PathBuf {
    Path::new(output_dir).join(run_name)
}

/// Flat CSV form of an [`ImpactRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRow {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl From<&ImpactRecord> for ImpactRow {
    fn from(i: &ImpactRecord) -> Self {
        Self {
            t: i.t,
            x: i.position.x,
            y: i.position.y,
            z: i.position.z,
            vx: i.velocity.x,
            vy: i.velocity.y,
            vz: i.velocity.z,
        }
    }
}

impl From<ImpactRow> for ImpactRecord {
    fn from(row: ImpactRow) -> Self {
        Self {
            t: row.t,
            position: Vector3::new(row.x, row.y, row.z),
            velocity: Vector3::new(row.vx, row.vy, row.vz),
        }
    }
}

/// Write impact records as CSV with a header row.
pub fn write_impact_csv<W: Write>(out: W, impacts: &[ImpactRecord]) -> SimResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for impact in impacts {
        wtr.serialize(ImpactRow::from(impact))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_impact_csv<P: AsRef<Path>>(path: P, impacts: &[ImpactRecord]) -> SimResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    write_impact_csv(File::create(path)?, impacts)
}

/// Read impact records back from a file written by [`save_impact_csv`].
pub fn load_impact_csv<P: AsRef<Path>>(path: P) -> SimResult<Vec<ImpactRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut impacts = Vec::new();
    for row in reader.deserialize::<ImpactRow>() {
        impacts.push(row?.into());
    }
    Ok(impacts)
}

pub fn save_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> SimResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VehicleState;

    fn sample_tracks() -> Tracks {
        let s = VehicleState::at_launch(0.0, 0.0);
        Tracks {
            truth: s,
            estimated: s,
            desired: s,
        }
    }

    #[test]
    fn test_csv_header_and_row() {
        let mut writer = CsvTrajectoryWriter::new(Vec::new());
        writer.record(&sample_tracks(), 400.0).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("t,x,y,z,vx"));
        assert!(lines[0].contains("az_total,current_mass,est_t"));
        assert_eq!(lines[0].split(',').count(), 45);
        assert_eq!(lines[1].split(',').count(), 45);
    }

    #[test]
    fn test_trajectory_rows_read_back() {
        let mut tracks = sample_tracks();
        tracks.estimated.position.y = 12.5;
        let mut writer = CsvTrajectoryWriter::new(Vec::new());
        writer.record(&tracks, 400.0).unwrap();
        writer.record(&tracks, 390.0).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<TrajectoryRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], TrajectoryRow::new(&tracks, 400.0));
        assert_eq!(rows[1].current_mass, 390.0);
        assert_eq!(rows[1].est_y, 12.5);
        assert_eq!(rows[1].x, tracks.truth.position.x);
    }

    #[test]
    fn test_impact_csv() {
        let impacts = vec![ImpactRecord {
            t: 1.5,
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(-1.0, 0.0, 0.0),
        }];
        let mut buf = Vec::new();
        write_impact_csv(&mut buf, &impacts).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "t,x,y,z,vx,vy,vz\n1.5,1.0,2.0,3.0,-1.0,0.0,0.0\n");
    }

    #[test]
    fn test_impact_file_rejects_malformed_rows() {
        let dir = std::env::temp_dir().join("ballistic_mc_malformed_impacts");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("impact_data.csv");
        fs::write(&path, "t,x,y,z,vx,vy,vz\n1.0,2.0,not-a-number,0,0,0,0\n").unwrap();
        assert!(matches!(load_impact_csv(&path), Err(SimError::Csv(_))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::default();
        sink.record(&sample_tracks(), 1.0).unwrap();
        sink.record(&sample_tracks(), 2.0).unwrap();
        assert_eq!(sink.rows.len(), 2);
        assert_eq!(sink.rows[1].1, 2.0);
    }
}
