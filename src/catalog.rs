use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::peer::{PeerRecord, Protocol};

/// Pattern for advertised peer URIs, restricted to the enabled kinds.
///
/// Catalog documents advertise peers as inline code spans of the form
/// `` `proto://host:port` ``.
pub fn peer_pattern(kinds: &[Protocol]) -> Regex {
    let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
    let pattern = format!(r"`({})://([a-z0-9.\-:\[\]]+):([0-9]+)`", labels.join("|"));
    Regex::new(&pattern).expect("peer pattern is well formed")
}

/// Scan the peers repository checkout for advertised peers.
///
/// Layout: one directory per region, one markdown file per country.
/// Empty `regions`/`countries` means all of them; requested countries
/// arrive without the `.md` suffix.
pub fn get_peers(
    data_dir: &Path,
    regions: &[String],
    countries: &[String],
    pattern: &Regex,
) -> Result<Vec<PeerRecord>, Box<dyn std::error::Error>> {
    if !data_dir.join("README.md").exists() {
        return Err(format!("{} is not a peers repository", data_dir.display()).into());
    }

    let regions = if regions.is_empty() {
        list_regions(data_dir)?
    } else {
        regions.to_vec()
    };
    let countries = if countries.is_empty() {
        list_countries(data_dir, &regions)?
    } else {
        countries.iter().map(|c| format!("{}.md", c)).collect()
    };

    let mut peers = Vec::new();
    for region in &regions {
        for country in &countries {
            let country_file = data_dir.join(region).join(country);
            if !country_file.exists() {
                continue;
            }
            let text = fs::read_to_string(&country_file)?;
            for caps in pattern.captures_iter(&text) {
                let Some(protocol) = Protocol::from_label(&caps[1]) else {
                    continue;
                };
                let port: u16 = match caps[3].parse() {
                    Ok(0) | Err(_) => {
                        debug!("Skipping peer with bad port in {}: {}", country_file.display(), &caps[0]);
                        continue;
                    }
                    Ok(port) => port,
                };
                peers.push(PeerRecord {
                    protocol,
                    host: caps[2].to_string(),
                    port,
                    region: region.clone(),
                    country: country.clone(),
                });
            }
        }
    }
    Ok(peers)
}

fn list_regions(data_dir: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut regions = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != ".git" && name != "other" {
            regions.push(name);
        }
    }
    regions.sort();
    Ok(regions)
}

fn list_countries(
    data_dir: &Path,
    regions: &[String],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut countries = Vec::new();
    for region in regions {
        for entry in fs::read_dir(data_dir.join(region))? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".md") {
                countries.push(name);
            }
        }
    }
    countries.sort();
    countries.dedup();
    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# public peers").unwrap();

        fs::create_dir(dir.path().join("europe")).unwrap();
        fs::write(
            dir.path().join("europe").join("germany.md"),
            "* `tcp://de1.example.org:9001`\n\
             * `tls://de1.example.org:9002`\n\
             * `quic://[2001:db8::1]:9003`\n\
             not a peer: `ftp://nope.example.org:21`\n",
        )
        .unwrap();

        fs::create_dir(dir.path().join("asia")).unwrap();
        fs::write(
            dir.path().join("asia").join("japan.md"),
            "`ws://jp.example.org:80` and `wss://jp.example.org:443`\n\
             bad port: `tcp://jp.example.org:99999`\n",
        )
        .unwrap();

        // the "other" directory is not a region
        fs::create_dir(dir.path().join("other")).unwrap();
        fs::write(
            dir.path().join("other").join("stale.md"),
            "`tcp://stale.example.org:1`\n",
        )
        .unwrap();

        dir
    }

    #[test]
    fn scans_all_regions_by_default() {
        let repo = fake_repo();
        let pattern = peer_pattern(&Protocol::ALL);
        let peers = get_peers(repo.path(), &[], &[], &pattern).unwrap();

        let uris: Vec<String> = peers.iter().map(|p| p.uri()).collect();
        assert!(uris.contains(&"tcp://de1.example.org:9001".to_string()));
        assert!(uris.contains(&"tls://de1.example.org:9002".to_string()));
        assert!(uris.contains(&"quic://[2001:db8::1]:9003".to_string()));
        assert!(uris.contains(&"ws://jp.example.org:80".to_string()));
        assert!(uris.contains(&"wss://jp.example.org:443".to_string()));
        // ftp span, out-of-range port and the "other" directory are ignored
        assert_eq!(peers.len(), 5);
    }

    #[test]
    fn region_and_country_filters_narrow_the_scan() {
        let repo = fake_repo();
        let pattern = peer_pattern(&Protocol::ALL);

        let peers = get_peers(repo.path(), &["europe".into()], &[], &pattern).unwrap();
        assert_eq!(peers.len(), 3);
        assert!(peers.iter().all(|p| p.region == "europe"));

        let peers = get_peers(repo.path(), &[], &["japan".into()], &pattern).unwrap();
        assert_eq!(peers.len(), 2);
        assert!(peers.iter().all(|p| p.country == "japan.md"));
    }

    #[test]
    fn protocol_filter_narrows_the_pattern() {
        let repo = fake_repo();
        let pattern = peer_pattern(&[Protocol::Quic, Protocol::Wss]);
        let peers = get_peers(repo.path(), &[], &[], &pattern).unwrap();

        assert_eq!(peers.len(), 2);
        assert!(peers
            .iter()
            .all(|p| matches!(p.protocol, Protocol::Quic | Protocol::Wss)));
    }

    #[test]
    fn directory_without_readme_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pattern = peer_pattern(&Protocol::ALL);
        assert!(get_peers(dir.path(), &[], &[], &pattern).is_err());
    }
}
