//! Single-layer LSTM with a linear read-out.
//!
//! Gate weights are stacked row-wise in the order input, forget, candidate,
//! output, so one product per step yields all four pre-activations. Trained
//! with full backpropagation through time and Adam on mean squared error.

use ndarray::{s, Array, Array1, Array2, ArrayView1, ArrayView2, Axis, Dimension, Zip};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::Normal;

use crate::services::forecast::ForecastError;

const GRAD_CLIP: f64 = 5.0;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Trainable tensors. Gradients and Adam moments share the same shape.
#[derive(Debug, Clone)]
struct Weights {
    /// Input to gates, `4H × I`.
    w: Array2<f64>,
    /// Hidden state to gates, `4H × H`.
    u: Array2<f64>,
    b: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
}

impl Weights {
    fn zeros(input: usize, hidden: usize) -> Self {
        Self {
            w: Array2::zeros((4 * hidden, input)),
            u: Array2::zeros((4 * hidden, hidden)),
            b: Array1::zeros(4 * hidden),
            w_out: Array1::zeros(hidden),
            b_out: 0.0,
        }
    }

    fn len(&self) -> usize {
        self.w.len() + self.u.len() + self.b.len() + self.w_out.len() + 1
    }

    fn norm(&self) -> f64 {
        let sq = |a: f64, v: &f64| a + v * v;
        (self.w.fold(0.0, sq)
            + self.u.fold(0.0, sq)
            + self.b.fold(0.0, sq)
            + self.w_out.fold(0.0, sq)
            + self.b_out * self.b_out)
            .sqrt()
    }

    fn scale(&mut self, factor: f64) {
        self.w *= factor;
        self.u *= factor;
        self.b *= factor;
        self.w_out *= factor;
        self.b_out *= factor;
    }

    fn clear(&mut self) {
        self.w.fill(0.0);
        self.u.fill(0.0);
        self.b.fill(0.0);
        self.w_out.fill(0.0);
        self.b_out = 0.0;
    }
}

/// Activations kept for the backward pass.
struct StepCache {
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct LstmNetwork {
    hidden_size: usize,
    weights: Weights,
}

impl LstmNetwork {
    /// Xavier-normal weights, zero biases except a forget-gate bias of 1.
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Result<Self, ForecastError> {
        let std_dev = (2.0 / (input_size + hidden_size).max(1) as f64).sqrt();
        let normal = Normal::new(0.0, std_dev).map_err(|e| ForecastError::Fit(e.to_string()))?;

        let mut b = Array1::zeros(4 * hidden_size);
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Ok(Self {
            hidden_size,
            weights: Weights {
                w: Array2::random_using((4 * hidden_size, input_size), normal, rng),
                u: Array2::random_using((4 * hidden_size, hidden_size), normal, rng),
                b,
                w_out: Array1::random_using(hidden_size, normal, rng),
                b_out: 0.0,
            },
        })
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, seq: ArrayView2<f64>) -> (f64, Vec<StepCache>, Array1<f64>) {
        let n = self.hidden_size;
        let p = &self.weights;
        let mut h = Array1::<f64>::zeros(n);
        let mut c = Array1::<f64>::zeros(n);
        let mut caches = Vec::with_capacity(seq.nrows());

        for x in seq.rows() {
            let z = p.w.dot(&x) + p.u.dot(&h) + &p.b;
            let i = z.slice(s![..n]).mapv(sigmoid);
            let f = z.slice(s![n..2 * n]).mapv(sigmoid);
            let g = z.slice(s![2 * n..3 * n]).mapv(f64::tanh);
            let o = z.slice(s![3 * n..]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            caches.push(StepCache {
                h_prev: std::mem::replace(&mut h, h_next),
                c_prev: std::mem::replace(&mut c, c_next),
                i,
                f,
                g,
                o,
                tanh_c,
            });
        }

        let out = p.w_out.dot(&h) + p.b_out;
        (out, caches, h)
    }

    /// Network output for one window, rows ordered oldest first.
    pub fn predict(&self, seq: ArrayView2<f64>) -> f64 {
        self.forward(seq).0
    }

    /// Add the gradient of `(prediction − target)²` to `grad` and return the
    /// squared error.
    fn accumulate_gradient(&self, seq: ArrayView2<f64>, target: f64, grad: &mut Weights) -> f64 {
        let n = self.hidden_size;
        let p = &self.weights;
        let (out, caches, h_last) = self.forward(seq);
        let err = out - target;
        let d_out = 2.0 * err;

        grad.b_out += d_out;
        grad.w_out.scaled_add(d_out, &h_last);

        let mut dh = &p.w_out * d_out;
        let mut dc = Array1::<f64>::zeros(n);
        let mut dz = Array1::<f64>::zeros(4 * n);

        for (t, cache) in caches.iter().enumerate().rev() {
            let x = seq.row(t);
            dc += &(&dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v));

            dz.slice_mut(s![..n])
                .assign(&(&dc * &cache.g * &cache.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![n..2 * n])
                .assign(&(&dc * &cache.c_prev * &cache.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * n..3 * n])
                .assign(&(&dc * &cache.i * &cache.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * n..])
                .assign(&(&dh * &cache.tanh_c * &cache.o.mapv(|v| v * (1.0 - v))));
            dc *= &cache.f;

            grad.b += &dz;
            grad.w += &outer(dz.view(), x);
            grad.u += &outer(dz.view(), cache.h_prev.view());
            dh = p.u.t().dot(&dz);
        }

        err * err
    }

    /// Mini-batch Adam over shuffled windows. Returns the mean squared error
    /// of the final epoch.
    pub fn fit(
        &mut self,
        windows: &[ArrayView2<f64>],
        targets: &[f64],
        epochs: usize,
        batch_size: usize,
        learning_rate: f64,
        rng: &mut StdRng,
    ) -> f64 {
        let input = self.weights.w.ncols();
        let mut adam = Adam::new(input, self.hidden_size, learning_rate);
        let mut grad = Weights::zeros(input, self.hidden_size);
        let mut order: Vec<usize> = (0..windows.len().min(targets.len())).collect();
        let mut last_loss = 0.0;

        for _ in 0..epochs {
            order.shuffle(rng);
            let mut epoch_loss = 0.0;
            for chunk in order.chunks(batch_size.max(1)) {
                grad.clear();
                for &idx in chunk {
                    epoch_loss += self.accumulate_gradient(windows[idx], targets[idx], &mut grad);
                }
                grad.scale(1.0 / chunk.len() as f64);
                let norm = grad.norm();
                if norm > GRAD_CLIP {
                    grad.scale(GRAD_CLIP / norm);
                }
                adam.step(&mut self.weights, &grad);
            }
            last_loss = epoch_loss / order.len().max(1) as f64;
        }
        last_loss
    }
}

/// `a ⊗ b` as an `len(a) × len(b)` matrix.
fn outer(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array2<f64> {
    a.insert_axis(Axis(1)).dot(&b.insert_axis(Axis(0)))
}

struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Weights,
    v: Weights,
    t: i32,
}

/// Bias-corrected step constants for one update.
#[derive(Clone, Copy)]
struct AdamStep {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    bias1: f64,
    bias2: f64,
}

impl AdamStep {
    fn apply(&self, p: &mut f64, m: &mut f64, v: &mut f64, g: f64) {
        *m = self.beta1 * *m + (1.0 - self.beta1) * g;
        *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
        *p -= self.learning_rate * (*m / self.bias1) / ((*v / self.bias2).sqrt() + self.epsilon);
    }

    fn update<D: Dimension>(
        &self,
        p: &mut Array<f64, D>,
        m: &mut Array<f64, D>,
        v: &mut Array<f64, D>,
        g: &Array<f64, D>,
    ) {
        Zip::from(p)
            .and(m)
            .and(v)
            .and(g)
            .for_each(|p, m, v, &g| self.apply(p, m, v, g));
    }
}

impl Adam {
    fn new(input: usize, hidden: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: Weights::zeros(input, hidden),
            v: Weights::zeros(input, hidden),
            t: 0,
        }
    }

    fn step(&mut self, params: &mut Weights, grad: &Weights) {
        self.t += 1;
        let step = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            bias1: 1.0 - self.beta1.powi(self.t),
            bias2: 1.0 - self.beta2.powi(self.t),
        };
        let (m, v) = (&mut self.m, &mut self.v);
        step.update(&mut params.w, &mut m.w, &mut v.w, &grad.w);
        step.update(&mut params.u, &mut m.u, &mut v.u, &grad.u);
        step.update(&mut params.b, &mut m.b, &mut v.b, &grad.b);
        step.update(&mut params.w_out, &mut m.w_out, &mut v.w_out, &grad.w_out);
        step.apply(&mut params.b_out, &mut m.b_out, &mut v.b_out, grad.b_out);
    }
}
