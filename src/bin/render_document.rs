//! Command line front end: renders a JSON job into PDFs and a manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use serde::{Deserialize, Serialize};

use school_pdf_renderer::batch::{generate_bulletins_with, BatchFailure};
use school_pdf_renderer::image_embed::ImageEmbedder;
use school_pdf_renderer::timetable::generate_timetable_with;
use school_pdf_renderer::{OrganizationRecord, RenderOptions, RendererResult, StudentRecord, TimetableRecord, VerificationMetadata};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory the PDFs and manifest.json are written to
    #[arg(short, long, global = true, default_value = "out")]
    out_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one report card per student in the job
    Bulletins {
        /// JSON job: { organization, options, students }
        job: PathBuf,
    },
    /// Render a class timetable
    Timetable {
        /// JSON job: { organization, options, timetable }
        job: PathBuf,
    },
}

#[derive(Deserialize)]
struct BulletinJob {
    organization: OrganizationRecord,
    #[serde(default)]
    options: Option<RenderOptions>,
    students: Vec<StudentRecord>,
}

#[derive(Deserialize)]
struct TimetableJob {
    organization: OrganizationRecord,
    #[serde(default)]
    options: Option<RenderOptions>,
    timetable: TimetableRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    file: String,
    entity_id: Option<u64>,
    #[serde(flatten)]
    verification: VerificationMetadata,
    layout_fits: bool,
}

#[derive(Serialize, Default)]
struct Manifest {
    documents: Vec<ManifestEntry>,
    failures: Vec<BatchFailure>,
}

fn read_job<T: serde::de::DeserializeOwned>(path: &Path) -> RendererResult<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Relative image references in a job resolve against the job's directory.
fn embedder_for(job: &Path, options: &RenderOptions) -> ImageEmbedder {
    let embedder = ImageEmbedder::from_options(options);
    match job.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => embedder.with_base_dir(dir),
        None => embedder,
    }
}

fn safe_file_part(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn run_bulletins(job_path: &Path, out_dir: &Path) -> RendererResult<Manifest> {
    let job: BulletinJob = read_job(job_path)?;
    let options = job.options.unwrap_or_default();
    options.validate()?;
    let embedder = embedder_for(job_path, &options);

    let output = generate_bulletins_with(&job.students, &job.organization, &options, &embedder);
    let mut manifest = Manifest {
        failures: output.failures,
        ..Manifest::default()
    };
    for (index, doc) in output.documents {
        let student = &job.students[index];
        let file = format!(
            "bulletin-{}-{}.pdf",
            student.id.unwrap_or_default(),
            safe_file_part(&student.period_id)
        );
        std::fs::write(out_dir.join(&file), &doc.bytes)?;
        manifest.documents.push(ManifestEntry {
            file,
            entity_id: student.id,
            verification: doc.verification,
            layout_fits: doc.layout_fits,
        });
    }
    Ok(manifest)
}

fn run_timetable(job_path: &Path, out_dir: &Path) -> RendererResult<Manifest> {
    let job: TimetableJob = read_job(job_path)?;
    let options = job.options.unwrap_or_else(RenderOptions::timetable_defaults);
    let embedder = embedder_for(job_path, &options);

    let doc = generate_timetable_with(&job.timetable, &job.organization, &options, &embedder)?;
    let file = format!("timetable-{}.pdf", safe_file_part(&job.timetable.class_name));
    std::fs::write(out_dir.join(&file), &doc.bytes)?;
    Ok(Manifest {
        documents: vec![ManifestEntry {
            file,
            entity_id: job.timetable.class_id,
            verification: doc.verification,
            layout_fits: doc.layout_fits,
        }],
        failures: Vec::new(),
    })
}

fn run(cli: &Cli) -> RendererResult<Manifest> {
    std::fs::create_dir_all(&cli.out_dir)?;
    let manifest = match &cli.command {
        Commands::Bulletins { job } => run_bulletins(job, &cli.out_dir)?,
        Commands::Timetable { job } => run_timetable(job, &cli.out_dir)?,
    };
    let manifest_path = cli.out_dir.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
    info!(
        "wrote {} document(s), {} failure(s), manifest at {}",
        manifest.documents.len(),
        manifest.failures.len(),
        manifest_path.display()
    );
    Ok(manifest)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(manifest) if manifest.failures.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
