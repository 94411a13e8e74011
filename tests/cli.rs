use std::path::PathBuf;
use std::process::Command;

use serde_json::{json, Value};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn bulletins_job_writes_pdfs_and_manifest() {
    let dir = temp_dir("render-cli");
    let job = json!({
        "organization": { "id": 4, "name": "Collège Vogt" },
        "options": { "includeQRCode": false, "language": "secondary" },
        "students": [
            {
                "id": 1, "firstName": "Ali", "lastName": "Moussa",
                "periodId": "T1", "academicYearId": "2024-2025",
                "subjects": [{ "name": "Maths", "scores": [12, 14], "coefficient": 5 }]
            },
            { "firstName": "No", "lastName": "Id", "periodId": "T1", "academicYearId": "2024-2025" }
        ]
    });
    let job_path = dir.join("job.json");
    std::fs::write(&job_path, serde_json::to_vec(&job).unwrap()).unwrap();
    let out = dir.join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_render-document"))
        .arg("--out-dir")
        .arg(&out)
        .arg("bulletins")
        .arg(&job_path)
        .status()
        .expect("run render-document");
    // One student failed, so the run reports partial success.
    assert_eq!(status.code(), Some(2));

    let manifest: Value = serde_json::from_slice(&std::fs::read(out.join("manifest.json")).unwrap()).unwrap();
    let docs = manifest["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["entityId"], 1);
    assert_eq!(docs[0]["code"].as_str().unwrap().len(), 8);
    assert_eq!(manifest["failures"].as_array().unwrap().len(), 1);

    let pdf = std::fs::read(out.join(docs[0]["file"].as_str().unwrap())).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}
