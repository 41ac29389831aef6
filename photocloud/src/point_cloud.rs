use crate::error::PhotoCloudError;
use nalgebra::{Point3, Vector3};
use std::fmt::Write as _;
use std::io::Write;

/// A flat `[x0, y0, z0, x1, y1, z1, ...]` buffer of object-centered coordinates in mm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudBuffer {
    coords: Vec<f32>,
}

impl PointCloudBuffer {
    pub fn with_capacity(points: usize) -> Self {
        PointCloudBuffer {
            coords: Vec::with_capacity(points * 3),
        }
    }

    pub fn push(&mut self, point: Point3<f32>) {
        self.coords.extend_from_slice(&[point.x, point.y, point.z]);
    }

    /// Number of points (one third of the coordinate count).
    pub fn len(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// The raw coordinate triples.
    pub fn as_slice(&self) -> &[f32] {
        &self.coords
    }

    pub fn points(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
    }

    /// Axis-aligned `(min, max)` corners, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self.points();
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Mean position, or `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.is_empty() {
            return None;
        }
        let sum: Vector3<f32> = self.points().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.len() as f32))
    }

    /// Wavefront OBJ vertex list, one `v x y z` line per point.
    pub fn to_obj(&self) -> String {
        let mut result = String::with_capacity(self.len() * 32);
        result.push_str("# photocloud preview point cloud\n");
        let _ = writeln!(result, "# {} points, millimeters", self.len());
        for p in self.points() {
            let _ = writeln!(result, "v {} {} {}", p.x, p.y, p.z);
        }
        result
    }

    /// ASCII PLY with `x y z` float vertex properties.
    pub fn to_ply(&self) -> String {
        let mut result = String::with_capacity(self.len() * 32 + 128);
        result.push_str("ply\nformat ascii 1.0\ncomment photocloud preview point cloud\n");
        let _ = writeln!(result, "element vertex {}", self.len());
        result.push_str("property float x\nproperty float y\nproperty float z\nend_header\n");
        for p in self.points() {
            let _ = writeln!(result, "{} {} {}", p.x, p.y, p.z);
        }
        result
    }

    /// An X3D document rendering the cloud as a `PointSet`.
    pub fn to_x3d(&self) -> String {
        let mut result = String::new();
        result.push_str(
            r#"<X3D width="1000px" height="1000px">
    <head>
        <meta name='title' content='Point Cloud Preview'/>
        <meta name='description' content='Synthetic point cloud in millimeters'/>
    </head>
    <Scene>
        <Shape>
            <Appearance>
                <Material emissiveColor='0.2 0.6 0.9'></Material>
            </Appearance>
            <PointSet>
                <Coordinate point='"#,
        );

        for p in self.points() {
            let _ = write!(result, "{} {} {} ", p.x, p.y, p.z);
        }

        result.push_str(
            r#"'></Coordinate>
            </PointSet>
        </Shape>
    </Scene>
</X3D>"#,
        );
        result
    }

    pub fn write_obj<W: Write>(&self, writer: &mut W) -> Result<(), PhotoCloudError> {
        writer.write_all(self.to_obj().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_ply<W: Write>(&self, writer: &mut W) -> Result<(), PhotoCloudError> {
        writer.write_all(self.to_ply().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_x3d<W: Write>(&self, writer: &mut W) -> Result<(), PhotoCloudError> {
        writer.write_all(self.to_x3d().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl From<Vec<f32>> for PointCloudBuffer {
    /// Trailing values that do not form a full triple are dropped.
    fn from(mut coords: Vec<f32>) -> Self {
        coords.truncate(coords.len() / 3 * 3);
        PointCloudBuffer { coords }
    }
}
