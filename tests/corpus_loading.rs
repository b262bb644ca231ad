//! 语料库加载流水线集成测试：在临时目录中构造许可证与规则文件

use std::fs;
use std::path::{Path, PathBuf};

use licensedcode::{CorpusConfig, CorpusLoader, LicenseDbError, QueryTokenizer, RuleStats};
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    licenses_dir: PathBuf,
    rules_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let licenses_dir = root.path().join("licenses");
        let rules_dir = root.path().join("rules");
        fs::create_dir_all(&licenses_dir).unwrap();
        fs::create_dir_all(&rules_dir).unwrap();
        let fixture = Self {
            _root: root,
            licenses_dir,
            rules_dir,
        };
        fixture.license(
            "mit",
            "key: mit\nshort_name: MIT License\nname: MIT License\ncategory: Permissive\nowner: MIT\nspdx_license_key: MIT\n",
            "Permission is hereby granted, free of charge, to any person obtaining a copy",
        );
        fixture.license(
            "apache-2.0",
            "key: apache-2.0\nshort_name: Apache 2.0\nname: Apache License 2.0\ncategory: Permissive\nowner: Apache Software Foundation\n",
            "Apache License Version 2.0, January 2004",
        );
        fixture
    }

    fn license(&self, key: &str, yaml: &str, text: &str) {
        write(&self.licenses_dir, &format!("{}.yml", key), yaml);
        write(&self.licenses_dir, &format!("{}.LICENSE", key), text);
    }

    fn rule(&self, name: &str, yaml: &str, text: &str) {
        write(&self.rules_dir, &format!("{}.yml", name), yaml);
        write(&self.rules_dir, &format!("{}.RULE", name), text);
    }

    fn loader(&self) -> CorpusLoader {
        CorpusLoader::new(
            CorpusConfig::builder()
                .licenses_dir(&self.licenses_dir)
                .rules_dir(&self.rules_dir)
                .build(),
        )
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_get_rules_license_rules_first() {
    let fixture = Fixture::new();
    fixture.rule(
        "mit_or_apache_1",
        "license_expression: mit OR apache-2.0\nis_license_notice: true\n",
        "Licensed under either of Apache License, Version 2.0 or MIT license at your option.",
    );
    fixture.rule(
        "not_a_license_1",
        "is_false_positive: true\nnotes: matches the word license in prose\n",
        "license to kill",
    );
    // 编辑器备份文件不算孤儿
    write(&fixture.rules_dir, "mit_or_apache_1.yml~", "stale");

    let mut corpus = fixture.loader().get_rules().unwrap();
    assert_eq!(corpus.licenses_by_key.len(), 2);
    assert_eq!(corpus.rules.len(), 4);
    assert_eq!(corpus.license_rules_count(), 2);
    assert!(corpus.rules[0].is_license);
    assert!(corpus.rules[1].is_license);
    assert!(!corpus.rules[2].is_license);
    assert_eq!(
        corpus.rules[2].license_expression(),
        Some("mit OR apache-2.0")
    );

    corpus.tokenize_rules(&QueryTokenizer).unwrap();
    let fp = &corpus.rules[3];
    assert_eq!(fp.length, 3);
    assert_eq!(fp.relevance, 100);

    let stats = RuleStats::from_rules(&corpus.rules);
    assert_eq!(stats.total_rules, 4);
}

#[test]
fn test_orphaned_license_file_is_reported() {
    let fixture = Fixture::new();
    write(&fixture.licenses_dir, "stray.txt", "who am I");

    match fixture.loader().load_licenses() {
        Err(LicenseDbError::OrphanedLicenseFiles { files, .. }) => {
            assert_eq!(files, vec![fixture.licenses_dir.join("stray.txt")]);
        }
        other => panic!("expected orphaned files error, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn test_rule_with_unknown_license_key_is_reported() {
    let fixture = Fixture::new();
    fixture.rule(
        "zlib_1",
        "license_expression: zlib\nis_license_reference: true\n",
        "zlib license",
    );
    fixture.rule(
        "mit_2",
        "license_expression: mit\nis_license_reference: true\n",
        "MIT",
    );

    let err = fixture.loader().get_rules().unwrap_err();
    let message = err.to_string();
    match err {
        LicenseDbError::MissingLicenses(refs) => {
            let files: Vec<_> = refs.files().cloned().collect();
            assert_eq!(files, vec![fixture.rules_dir.join("zlib_1.yml")]);
        }
        other => panic!("expected missing licenses error, got {}", other),
    }
    assert!(message.contains("zlib_1.RULE"));
    assert!(!message.contains("mit_2"));
}

#[test]
fn test_rule_without_importance_flags_is_reported() {
    let fixture = Fixture::new();
    fixture.rule("mit_3", "license_expression: mit\n", "MIT licensed");

    match fixture.loader().get_rules() {
        Err(LicenseDbError::MissingFlags(files)) => {
            assert_eq!(files, vec![fixture.rules_dir.join("mit_3.yml")]);
        }
        other => panic!("expected missing flags error, got {:?}", other.map(|c| c.rules.len())),
    }
}

#[test]
fn test_rule_directory_problems_are_aggregated() {
    let fixture = Fixture::new();
    fixture.rule(
        "mit 4",
        "license_expression: mit\nis_license_tag: true\n",
        "MIT",
    );
    fixture.rule(
        "bad_fields",
        "license_expression: mit\nis_license_tag: true\nflavour: vanilla\n",
        "MIT",
    );
    fixture.rule(
        "no_expression",
        "is_license_tag: true\n",
        "MIT",
    );
    write(&fixture.rules_dir, "orphan.RULE", "nobody loads me");

    match fixture.loader().load_rules() {
        Err(LicenseDbError::RuleCorpus(issues)) => {
            assert_eq!(issues.model_errors.len(), 2);
            assert!(issues
                .orphaned_files
                .contains(&fixture.rules_dir.join("orphan.RULE")));
            assert_eq!(issues.orphaned_files.len(), 1);
            assert!(issues
                .space_in_names
                .contains(&fixture.rules_dir.join("mit 4.yml")));

            let message = LicenseDbError::RuleCorpus(issues).to_string();
            assert!(message.contains("unknown attributes: flavour"));
            assert!(message.contains("missing a license_expression"));
            assert!(message.contains("Orphaned files in rule directory"));
            assert!(message.contains("Rule files name cannot contain spaces"));
        }
        other => panic!("expected rule corpus error, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_rule_data_file_without_text_fails_loading() {
    let fixture = Fixture::new();
    write(
        &fixture.rules_dir,
        "mit_6.yml",
        "license_expression: mit\nis_license_tag: true\n",
    );

    match fixture.loader().load_rules() {
        Err(LicenseDbError::RuleCorpus(issues)) => {
            assert_eq!(issues.model_errors.len(), 1);
            assert!(issues.model_errors[0].contains("mit_6.RULE"));
            assert!(issues.orphaned_files.is_empty());
        }
        other => panic!("expected rule corpus error, got {:?}", other.map(|r| r.len())),
    }
    assert!(fixture.loader().get_rules().is_err());
}

#[test]
fn test_case_collisions_are_reported() {
    let fixture = Fixture::new();
    fixture.rule("MIT_5", "license_expression: mit\nis_license_tag: true\n", "MIT");
    fixture.rule("mit_5", "license_expression: mit\nis_license_tag: true\n", "mit");

    // 不区分大小写的文件系统上两组文件会合并成一组，此时无从检测
    let entries = fs::read_dir(&fixture.rules_dir).unwrap().count();
    if entries < 4 {
        return;
    }

    match fixture.loader().load_rules() {
        Err(LicenseDbError::RuleCorpus(issues)) => {
            assert!(!issues.case_collisions.is_empty());
            assert!(issues.model_errors.is_empty());
            assert!(issues.orphaned_files.is_empty());
        }
        other => panic!("expected rule corpus error, got {:?}", other.map(|r| r.len())),
    }
}
