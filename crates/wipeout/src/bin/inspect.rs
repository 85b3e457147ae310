//! Print summaries of object containers and track files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use wipeout::{Decoded, Loader, LoaderConfig, Mesh, Outcome, TrackPaths};

#[derive(Parser)]
#[command(about = "Inspect racing-game geometry files")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the objects of a container, or describe one of them.
    Prm {
        /// Container file.
        path: PathBuf,

        /// Decode only this object.
        #[arg(long)]
        object: Option<usize>,
    },
    /// Summarize a track.
    Track {
        /// Track vertex file.
        vertices: PathBuf,

        /// Track face file.
        faces: PathBuf,

        /// Track section file.
        #[arg(long)]
        sections: Option<PathBuf>,
    },
}

fn describe(mesh: &Mesh) {
    let textured = mesh.polygons.iter().filter(|p| p.is_textured()).count();
    println!(
        "{:<16} vertices {:>5}  normals {:>5}  polygons {:>5} ({textured} textured)  triangles {:>5}  radius {:.1}",
        mesh.name,
        mesh.vertices.len(),
        mesh.normals.len(),
        mesh.polygons.len(),
        mesh.triangle_count(),
        mesh.radius,
    );
}

fn report_outcome<T>(decoded: &Decoded<T>) {
    if let Outcome::Partial { reason } = &decoded.outcome {
        println!("stopped early: {reason}");
    }
}

fn run(args: CliArgs) -> wipeout::Result<()> {
    let loader = Loader::with_config(LoaderConfig {
        fallback_to_mock: false,
        ..LoaderConfig::default()
    });

    match args.command {
        Command::Prm {
            path,
            object: Some(index),
        } => {
            let decoded = loader.load_object(&path, index)?;
            describe(&decoded.value);
            report_outcome(&decoded);
        }
        Command::Prm { path, object: None } => {
            let scan = loader.scan_objects(&path)?;
            for entry in &scan.value {
                println!(
                    "{:>3} {:<16} vertices {:>5}  normals {:>5}  primitives {:>5}  @ {:#x}",
                    entry.index,
                    entry.name,
                    entry.vertex_count,
                    entry.normal_count,
                    entry.primitive_count,
                    entry.offset,
                );
            }
            report_outcome(&scan);
        }
        Command::Track {
            vertices,
            faces,
            sections,
        } => {
            let mut paths = TrackPaths::new(vertices, faces);
            paths.sections = sections;
            let track = loader.load_track(&paths)?;
            describe(&track.geometry.mesh);
            println!(
                "faces {}  skipped {}  sections {}",
                track.geometry.faces.len(),
                track.geometry.skipped_faces,
                track.sections.len(),
            );
            if !track.sections.is_empty() {
                println!("circuit length {}", track.sections.walk_forward(0).count());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "inspect failed");
            ExitCode::FAILURE
        }
    }
}
