//! Initial files for new projects

use crate::models::{NewFile, Project};
use serde_json::json;

const BUILDER_CONFIG: &str = r#"module.exports = {
  builderType: 'saas',
  visualBuilder: {
    enabled: true,
    theme: 'default'
  },
  adminPanel: {
    enabled: true,
    layout: 'sidebar'
  },
  businessPlanner: {
    enabled: true,
    analytics: true
  }
};"#;

const BUILDER_README: &str = "## SaaS Builder Project

This project uses the NextMonth visual builder for rapid application development.

### Features
- Visual drag-and-drop interface
- Admin panel builder
- Business planning tools
- One-click deployment";

const IDE_README: &str = "## PaaS Development Project

This project provides full IDE access for custom development.

### Features
- Complete code editor
- Terminal access
- Git integration
- Custom deployment configuration";

/// Whether a template gets the visual builder files
pub fn is_builder_template(template: &str) -> bool {
    template.contains("saas") || template.contains("visual")
}

/// Files every new project starts with
pub fn initial_files(project: &Project) -> Vec<NewFile> {
    let builder = is_builder_template(&project.template);

    let mut files = vec![
        NewFile::directory(project.id, "src", "/src"),
        NewFile::file(project.id, "package.json", "/package.json", package_json(project, builder)),
        NewFile::file(project.id, "README.md", "/README.md", readme(project, builder)),
    ];

    if builder {
        files.push(NewFile::file(
            project.id,
            "builder.config.js",
            "/builder.config.js",
            BUILDER_CONFIG,
        ));
    }

    files
}

fn package_json(project: &Project, builder: bool) -> String {
    let manifest = if builder {
        json!({
            "name": project.name,
            "version": "1.0.0",
            "scripts": {
                "dev": "npm run start",
                "build": "npm run build:saas",
                "start": "node index.js",
                "deploy": "npm run deploy:saas"
            },
            "dependencies": {
                "react": "^18.0.0",
                "react-dom": "^18.0.0",
                "@nextmonth/builder": "^1.0.0"
            }
        })
    } else {
        json!({
            "name": project.name,
            "version": "1.0.0",
            "scripts": {
                "dev": "npm run start",
                "build": "npm run build",
                "start": "node index.js"
            },
            "dependencies": {}
        })
    };
    serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| manifest.to_string())
}

fn readme(project: &Project, builder: bool) -> String {
    let description = project
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("A new project created with NextMonth R.I.D.");
    let body = if builder { BUILDER_README } else { IDE_README };
    format!("# {}\n\n{}\n\n{}", project.name, description, body)
}
