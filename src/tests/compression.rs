#[cfg(test)]
mod test {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use crate::prelude::*;
    use crate::tests::toolkit::*;

    #[test]
    fn gzip_sources() {
        let content = std::fs::read(resource(NAV_V2)).unwrap();

        let path = std::env::temp_dir().join(format!("navlib-{}.15n.gz", std::process::id()));
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&content).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut library = library(&[]);
        let loaded = library.add_data_source(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.unwrap(), 11);
        assert_eq!(library.len(), 11);
    }
}
