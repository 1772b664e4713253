//! Compiled-in skill vocabulary

use super::{SkillCategory, SkillEntry};
use SkillCategory::*;

/// (id, display name, category, synonyms)
const BUILTIN_SKILLS: &[(&str, &str, SkillCategory, &[&str])] = &[
    // Programming languages
    ("python", "Python", ProgrammingLanguage, &["py", "python3"]),
    ("java", "Java", ProgrammingLanguage, &[]),
    ("javascript", "JavaScript", ProgrammingLanguage, &["js", "JS", "ecmascript"]),
    ("typescript", "TypeScript", ProgrammingLanguage, &["ts", "TS"]),
    ("c", "C", ProgrammingLanguage, &[]),
    ("cpp", "C++", ProgrammingLanguage, &["cplusplus"]),
    ("csharp", "C#", ProgrammingLanguage, &["c sharp"]),
    ("go", "Go", ProgrammingLanguage, &["golang"]),
    ("rust", "Rust", ProgrammingLanguage, &["rustlang"]),
    ("ruby", "Ruby", ProgrammingLanguage, &[]),
    ("php", "PHP", ProgrammingLanguage, &[]),
    ("swift", "Swift", ProgrammingLanguage, &[]),
    ("kotlin", "Kotlin", ProgrammingLanguage, &[]),
    ("scala", "Scala", ProgrammingLanguage, &[]),
    ("r", "R", ProgrammingLanguage, &["rlang"]),
    ("matlab", "MATLAB", ProgrammingLanguage, &[]),
    ("bash", "Bash", ProgrammingLanguage, &["shell scripting"]),
    // Frameworks and libraries
    ("react", "React", Framework, &["reactjs", "react.js"]),
    ("angular", "Angular", Framework, &["angularjs"]),
    ("vue", "Vue", Framework, &["vuejs", "vue.js"]),
    ("django", "Django", Framework, &[]),
    ("flask", "Flask", Framework, &[]),
    ("fastapi", "FastAPI", Framework, &[]),
    ("spring", "Spring", Framework, &["spring boot"]),
    ("nodejs", "Node.js", Framework, &["nodejs", "node"]),
    ("expressjs", "Express.js", Framework, &[]),
    ("rails", "Ruby on Rails", Framework, &["rails"]),
    ("dotnet", ".NET", Framework, &["dotnet", "asp.net"]),
    ("tensorflow", "TensorFlow", Framework, &[]),
    ("pytorch", "PyTorch", Framework, &["torch"]),
    ("pandas", "pandas", Framework, &[]),
    ("numpy", "NumPy", Framework, &[]),
    ("scikit_learn", "scikit-learn", Framework, &["sklearn"]),
    // Databases
    ("sql", "SQL", Database, &[]),
    ("postgresql", "PostgreSQL", Database, &["postgres"]),
    ("mysql", "MySQL", Database, &[]),
    ("sqlite", "SQLite", Database, &[]),
    ("mongodb", "MongoDB", Database, &["mongo"]),
    ("redis", "Redis", Database, &[]),
    ("elasticsearch", "Elasticsearch", Database, &["elastic search"]),
    // Cloud platforms
    ("aws", "AWS", Cloud, &["amazon web services"]),
    ("azure", "Azure", Cloud, &["microsoft azure"]),
    ("gcp", "GCP", Cloud, &["google cloud", "google cloud platform"]),
    // Tools and software
    ("git", "Git", Tool, &["github", "gitlab"]),
    ("jira", "Jira", Tool, &[]),
    ("excel", "Excel", Tool, &["microsoft excel", "ms excel"]),
    ("tableau", "Tableau", Tool, &[]),
    ("power_bi", "Power BI", Tool, &["powerbi"]),
    ("linux", "Linux", Tool, &["unix"]),
    ("figma", "Figma", Tool, &[]),
    // Data science
    ("machine_learning", "Machine Learning", DataScience, &["ML"]),
    ("deep_learning", "Deep Learning", DataScience, &[]),
    ("data_analysis", "Data Analysis", DataScience, &["data analytics"]),
    ("data_visualization", "Data Visualization", DataScience, &["data viz"]),
    ("statistical_analysis", "Statistical Analysis", DataScience, &["statistical modeling", "statistical modelling"]),
    ("nlp", "NLP", DataScience, &["natural language processing"]),
    // Web technologies
    ("html", "HTML", Web, &["html5"]),
    ("css", "CSS", Web, &["css3"]),
    ("rest_api", "REST API", Web, &["rest apis", "restful", "restful api", "restful apis"]),
    ("graphql", "GraphQL", Web, &[]),
    // Mobile development
    ("android", "Android", Mobile, &[]),
    ("ios", "iOS", Mobile, &[]),
    ("react_native", "React Native", Mobile, &[]),
    ("flutter", "Flutter", Mobile, &[]),
    // DevOps
    ("docker", "Docker", DevOps, &[]),
    ("kubernetes", "Kubernetes", DevOps, &["k8s"]),
    ("terraform", "Terraform", DevOps, &[]),
    ("jenkins", "Jenkins", DevOps, &[]),
    ("ci_cd", "CI/CD", DevOps, &["continuous integration", "continuous delivery"]),
    ("ansible", "Ansible", DevOps, &[]),
    // Soft skills
    ("communication", "Communication", Soft, &["communication skills"]),
    ("leadership", "Leadership", Soft, &[]),
    ("teamwork", "Teamwork", Soft, &["team player", "collaboration"]),
    ("problem_solving", "Problem Solving", Soft, &["problem-solving"]),
    ("time_management", "Time Management", Soft, &[]),
    ("mentoring", "Mentoring", Soft, &["mentorship"]),
];

/// Per-skill demand where it differs from the category default.
const DEMAND_OVERRIDES: &[(&str, f32)] = &[
    ("python", 1.0),
    ("javascript", 0.95),
    ("sql", 0.95),
    ("aws", 0.95),
    ("java", 0.9),
    ("typescript", 0.9),
    ("kubernetes", 0.9),
    ("machine_learning", 0.95),
    ("tableau", 0.75),
    ("power_bi", 0.75),
    ("excel", 0.65),
    ("matlab", 0.6),
    ("php", 0.7),
];

pub fn builtin_entries() -> Vec<SkillEntry> {
    BUILTIN_SKILLS
        .iter()
        .map(|(id, name, category, synonyms)| {
            let entry = SkillEntry::new(id, name, *category, synonyms);
            match DEMAND_OVERRIDES.iter().find(|(skill, _)| skill == id) {
                Some((_, demand)) => entry.with_demand(*demand),
                None => entry,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::similarity::JaroWinkler;
    use crate::taxonomy::SkillTaxonomy;
    use std::sync::Arc;

    #[test]
    fn test_builtin_vocabulary_is_valid() {
        let tax = SkillTaxonomy::builtin(Arc::new(JaroWinkler), 0.9).unwrap();
        assert_eq!(tax.len(), BUILTIN_SKILLS.len());
    }

    #[test]
    fn test_demand_overrides_reference_known_skills() {
        for (id, _) in DEMAND_OVERRIDES {
            assert!(BUILTIN_SKILLS.iter().any(|(skill, ..)| skill == id), "unknown skill {}", id);
        }
    }

    #[test]
    fn test_every_category_is_covered() {
        let entries = builtin_entries();
        for category in [ProgrammingLanguage, Framework, Database, Cloud, Tool, DataScience, Web, Mobile, DevOps, Soft] {
            assert!(entries.iter().any(|e| e.category == category), "no skills for {}", category);
        }
    }
}
