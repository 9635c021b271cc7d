//! STL part meshes

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext, RenderAssetUsages};
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use std::io::{self, Cursor};

/// Loads ASCII and binary STL files as flat-shaded triangle lists
#[derive(Default)]
pub struct StlLoader;

impl AssetLoader for StlLoader {
    type Asset = Mesh;
    type Settings = ();
    type Error = io::Error;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Mesh, io::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let stl = stl_io::read_stl(&mut Cursor::new(bytes))?;
        tracing::debug!(triangles = stl.faces.len(), "Parsed STL mesh");
        mesh_from_stl(&stl)
    }

    fn extensions(&self) -> &[&str] {
        &["stl"]
    }
}

/// Unshare the indexed vertices so every face carries its own normal
pub fn mesh_from_stl(stl: &stl_io::IndexedMesh) -> io::Result<Mesh> {
    if stl.faces.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "STL file contains no triangles",
        ));
    }

    let mut positions = Vec::with_capacity(stl.faces.len() * 3);
    let mut normals = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        let corners = face.vertices.map(|index| stl.vertices.get(index).map(to_vec3));
        let [Some(a), Some(b), Some(c)] = corners else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "STL face references a missing vertex",
            ));
        };

        // Stored normals are often zeroed, so prefer the winding
        let normal = (b - a)
            .cross(c - a)
            .try_normalize()
            .unwrap_or_else(|| to_vec3(&face.normal));
        for corner in [a, b, c] {
            positions.push(corner.to_array());
            normals.push(normal.to_array());
        }
    }

    Ok(
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals),
    )
}

fn to_vec3(v: &stl_io::Vector<f32>) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// True for paths the STL loader handles
pub fn is_stl(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const ASCII_TRIANGLE: &str = "\
solid Nuclei00001
  facet normal 0 0 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid Nuclei00001
";

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|attr| attr.as_float3())
            .unwrap()
            .to_vec()
    }

    fn normals(mesh: &Mesh) -> Vec<[f32; 3]> {
        mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
            .and_then(|attr| attr.as_float3())
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_ascii_stl_uses_winding_normal() {
        let stl = stl_io::read_stl(&mut Cursor::new(ASCII_TRIANGLE.as_bytes())).unwrap();
        let mesh = mesh_from_stl(&stl).unwrap();

        assert_eq!(
            positions(&mesh),
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
        assert_eq!(normals(&mesh), vec![[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn test_binary_stl_faces_are_unshared() {
        let v = |x, y, z| stl_io::Vertex::new([x, y, z]);
        let triangles = [
            stl_io::Triangle {
                normal: stl_io::Normal::new([0.0, 0.0, 1.0]),
                vertices: [v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)],
            },
            stl_io::Triangle {
                normal: stl_io::Normal::new([0.0, -1.0, 0.0]),
                vertices: [v(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0), v(1.0, 0.0, 0.0)],
            },
        ];
        let mut bytes = Cursor::new(Vec::new());
        stl_io::write_stl(&mut bytes, triangles.iter()).unwrap();
        bytes.set_position(0);

        let mesh = mesh_from_stl(&stl_io::read_stl(&mut bytes).unwrap()).unwrap();
        assert_eq!(positions(&mesh).len(), 6);

        let normals = normals(&mesh);
        assert_eq!(normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(normals[3], [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_degenerate_face_falls_back_to_stored_normal() {
        let stl = stl_io::IndexedMesh {
            vertices: vec![stl_io::Vertex::new([1.0, 1.0, 1.0])],
            faces: vec![stl_io::IndexedTriangle {
                normal: stl_io::Normal::new([1.0, 0.0, 0.0]),
                vertices: [0, 0, 0],
            }],
        };
        let mesh = mesh_from_stl(&stl).unwrap();
        assert_eq!(normals(&mesh), vec![[1.0, 0.0, 0.0]; 3]);
    }

    #[test]
    fn test_invalid_stl_is_error() {
        let empty = stl_io::IndexedMesh {
            vertices: Vec::new(),
            faces: Vec::new(),
        };
        assert!(mesh_from_stl(&empty).is_err());

        let dangling = stl_io::IndexedMesh {
            vertices: vec![stl_io::Vertex::new([0.0, 0.0, 0.0])],
            faces: vec![stl_io::IndexedTriangle {
                normal: stl_io::Normal::new([0.0, 0.0, 1.0]),
                vertices: [0, 1, 2],
            }],
        };
        assert!(mesh_from_stl(&dangling).is_err());
    }

    #[test]
    fn test_is_stl() {
        assert!(is_stl(Path::new("parts/Nuclei00001.stl")));
        assert!(is_stl(Path::new("parts/Nuclei00002.STL")));
        assert!(!is_stl(Path::new("parts/Pons.glb")));
        assert!(!is_stl(Path::new("parts/stl")));
    }
}
