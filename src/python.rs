use pyo3::prelude::*;
use pyo3::exceptions;

use crate::config::IndexConfig;
use crate::error::Error;
use crate::termdex::{Query, TermDex};
use crate::utils;

fn to_pyerr(err: Error) -> PyErr {
    match err {
        Error::InvalidConfig { .. } | Error::Config(_) => {
            PyErr::new::<exceptions::PyValueError, _>(err.to_string())
        }
        Error::Io(_) => PyErr::new::<exceptions::PyIOError, _>(err.to_string()),
        _ => PyErr::new::<exceptions::PyRuntimeError, _>(err.to_string()),
    }
}

#[pyclass(name = "TermDex")]
pub struct PyTermDex {
    dex: TermDex,
}

// Python wrapper for the index proper.
#[pymethods]
impl PyTermDex {
    #[new]
    fn new(qgram: Option<usize>, num_hashes: Option<usize>, bands: Option<usize>,
           threshold: Option<f64>, seed: Option<u64>) -> PyResult<Self> {
        let defaults = IndexConfig::default();
        let config = defaults.clone()
            .qgram(qgram.unwrap_or(defaults.qgram))
            .num_hashes(num_hashes.unwrap_or(defaults.num_hashes))
            .bands(bands.unwrap_or(defaults.bands))
            .threshold(threshold.unwrap_or(defaults.threshold))
            .seed(seed.unwrap_or(defaults.seed));
        let dex = TermDex::new(config).map_err(to_pyerr)?;
        Ok(PyTermDex { dex })
    }

    #[staticmethod]
    fn load(path: &str) -> PyResult<Self> {
        let dex = TermDex::load(path).map_err(to_pyerr)?;
        Ok(PyTermDex { dex })
    }

    fn add(&mut self, id: &str, shingles: Vec<&str>) -> PyResult<()> {
        self.dex.add_shingles(id, &shingles).map_err(to_pyerr)
    }

    fn add_term(&mut self, id: &str, text: &str) -> PyResult<()> {
        self.dex.add_term(id, text).map_err(to_pyerr)
    }

    fn finish(&mut self) -> PyResult<()> {
        self.dex.finish().map_err(to_pyerr)
    }

    fn save(&mut self, path: &str) -> PyResult<()> {
        self.dex.save(path).map_err(to_pyerr)
    }

    /// Query by shingles. Returns `[(id, score)]`, or `[id]` when
    /// `with_scores` is false.
    fn query(&mut self, py: Python, shingles: Vec<&str>, k: Option<usize>,
             with_scores: Option<bool>) -> PyResult<PyObject> {
        let query = Query::shingles(&shingles).limit(Some(k.unwrap_or(1)));
        self.run(py, query, with_scores.unwrap_or(true))
    }

    /// Query by normalized text, shingled the way terms were.
    fn query_text(&mut self, py: Python, text: &str, k: Option<usize>,
                  with_scores: Option<bool>) -> PyResult<PyObject> {
        let query = Query::text(text).limit(Some(k.unwrap_or(1)));
        self.run(py, query, with_scores.unwrap_or(true))
    }

    fn __len__(&self) -> usize {
        self.dex.len()
    }
}

impl PyTermDex {
    fn run(&mut self, py: Python, query: Query, with_scores: bool) -> PyResult<PyObject> {
        let index = self.dex.ready().map_err(to_pyerr)?;
        let hits = py.allow_threads(move || index.search(&query)).map_err(to_pyerr)?;
        if with_scores {
            let pairs: Vec<(String, f64)> = hits.into_iter().map(|hit| (hit.id, hit.score)).collect();
            Ok(pairs.into_py(py))
        } else {
            let ids: Vec<String> = hits.into_iter().map(|hit| hit.id).collect();
            Ok(ids.into_py(py))
        }
    }
}

#[pyfunction]
fn shingle(text: &str, qgram: Option<usize>) -> PyResult<Vec<String>> {
    let shingler = utils::Shingler::new(qgram.unwrap_or(3)).map_err(to_pyerr)?;
    Ok(shingler.transform(text))
}

#[pyfunction]
fn normalize(text: &str) -> PyResult<String> {
    Ok(utils::normalize(text))
}

#[pymodule]
fn termdex(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add("__doc__", "MinHash LSH index for fuzzy terminology lookup")?;
    m.add_class::<PyTermDex>()?;
    m.add_function(wrap_pyfunction!(shingle, m)?)?;
    m.add_function(wrap_pyfunction!(normalize, m)?)?;
    Ok(())
}
